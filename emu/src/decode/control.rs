//! # Control word
//!
//! The decoder configures the datapath through a 15-bit packed word. The two
//! lanes have the same 6-bit layout, the post stage owns the 3 lowest bits.
//!
//! ```text
//!  14   13   12  11..9  8    7    6   5..3   2    1    0
//! ┌────┬────┬────┬─────┬────┬────┬────┬─────┬────┬────┬────┐
//! │preE│preS│mulE│ sel │preE│preS│mulE│ sel │pstE│pstS│pstZ│
//! └────┴────┴────┴─────┴────┴────┴────┴─────┴────┴────┴────┘
//!  ◄──────── X lane ───────► ◄──────── Y lane ───────►  post
//! ```
//!
//! - **preE / preS**: pre-adder enable, subtract instead of add
//! - **mulE**: multiply; when off the lane packs its two multiplier inputs
//! - **sel**: second multiplier input, see [`MulSel`]
//! - **pstE / pstS**: post adder enable, subtract instead of add
//! - **pstZ**: feed zero instead of the Y product into the post adder

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// One of the two arithmetic paths of the datapath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    X,
    Y,
}

impl Lane {
    /// Lowest bit of the lane field inside the control word.
    const fn base(self) -> u8 {
        match self {
            Self::X => 9,
            Self::Y => 3,
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Second input of a lane multiplier (3-bit field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulSel {
    /// Lane operand 0.
    Operand0,
    /// Lane operand 1.
    Operand1,
    /// The lane's own pre-stage result; with the pre result on the other
    /// input this squares it.
    OwnPre,
    /// The cross-lane "c" feed used by the interpolations.
    Cross,
    /// Constant one, the multiplier becomes a passthrough.
    One,
    /// Encodings 5 to 7, the multiplexer outputs zero.
    Reserved(u8),
}

impl MulSel {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::Operand0,
            1 => Self::Operand1,
            2 => Self::OwnPre,
            3 => Self::Cross,
            4 => Self::One,
            other => Self::Reserved(other),
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Operand0 => 0,
            Self::Operand1 => 1,
            Self::OwnPre => 2,
            Self::Cross => 3,
            Self::One => 4,
            Self::Reserved(bits) => bits & 0b111,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOp {
    Add,
    Sub,
}

/// Per-lane view of the control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneControl {
    pub pre_en: bool,
    pub pre_sub: bool,
    pub mul_en: bool,
    pub mul_sel: MulSel,
}

/// Post stage view of the control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostControl {
    pub en: bool,
    pub sub: bool,
    /// Second adder input is a hard zero instead of the Y product.
    pub zero_second: bool,
}

/// The packed 15-bit control descriptor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlWord(u16);

impl ControlWord {
    pub const WIDTH: u8 = 15;

    const POST_EN: u8 = 2;
    const POST_SUB: u8 = 1;
    const POST_SEL: u8 = 0;

    /// Both multiplier selects on operand 1, every stage bypassed and the
    /// post stage concatenating.
    pub const IDENTITY: Self = Self(0)
        .with_mul_sel(Lane::X, MulSel::Operand1)
        .with_mul_sel(Lane::Y, MulSel::Operand1);

    /// Bits above the 15-bit word are dropped.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & 0x7FFF)
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    const fn with_flag(self, bit_idx: u8, value: bool) -> Self {
        let mask = 1 << bit_idx;
        if value {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }

    /// Enables the pre-adder of `lane`.
    #[must_use]
    pub const fn with_pre(self, lane: Lane, op: PreOp) -> Self {
        let base = lane.base();
        self.with_flag(base + 5, true)
            .with_flag(base + 4, matches!(op, PreOp::Sub))
    }

    /// Selects the second multiplier input of `lane` without touching the
    /// multiplier enable.
    #[must_use]
    pub const fn with_mul_sel(self, lane: Lane, sel: MulSel) -> Self {
        let base = lane.base();
        let cleared = self.0 & !(0b111 << base);
        Self(cleared | ((sel.bits() as u16) << base))
    }

    /// Enables the multiplier of `lane` with `sel` as second input.
    #[must_use]
    pub const fn with_mul(self, lane: Lane, sel: MulSel) -> Self {
        self.with_mul_sel(lane, sel).with_flag(lane.base() + 3, true)
    }

    /// Enables the post adder.
    #[must_use]
    pub const fn with_post(self, op: PostOp) -> Self {
        self.with_flag(Self::POST_EN, true)
            .with_flag(Self::POST_SUB, matches!(op, PostOp::Sub))
    }

    /// Routes a hard zero into the second post adder input.
    #[must_use]
    pub const fn with_post_zero(self) -> Self {
        self.with_flag(Self::POST_SEL, true)
    }

    #[must_use]
    pub fn lane(self, lane: Lane) -> LaneControl {
        let base = lane.base();
        LaneControl {
            pre_en: self.0.get_bit(base + 5),
            pre_sub: self.0.get_bit(base + 4),
            mul_en: self.0.get_bit(base + 3),
            mul_sel: MulSel::from_bits(self.0.get_bits(base..=base + 2) as u8),
        }
    }

    #[must_use]
    pub fn post(self) -> PostControl {
        PostControl {
            en: self.0.get_bit(Self::POST_EN),
            sub: self.0.get_bit(Self::POST_SUB),
            zero_second: self.0.get_bit(Self::POST_SEL),
        }
    }
}

impl Display for ControlWord {
    /// Lane fields separated by underscores: `XXXXXX_YYYYYY_PPP`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:06b}_{:06b}_{:03b}",
            self.0.get_bits(9..=14),
            self.0.get_bits(3..=8),
            self.0.get_bits(0..=2)
        )
    }
}
