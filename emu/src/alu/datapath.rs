//! The three combinational stages of the datapath.
//!
//! ```text
//!  X0 X1          Y0 Y1
//!   │  │           │  │
//! ┌─▼──▼─┐       ┌─▼──▼─┐
//! │ pre X│       │ pre Y│        5 bit, wraps
//! └──┬───┘       └──┬───┘
//!    │ ◄─sel── X1 ─┼──────┐
//!    │      ┌─ Y1 ─┘      │      cross feed
//! ┌──▼──────▼┐     ┌──────▼───┐
//! │  mul X   │     │  mul Y   │  10 bit, multiply or pack
//! └────┬─────┘     └────┬─────┘
//!      └──────┐  ┌──────┘
//!          ┌──▼──▼──┐
//!          │  post  │            10 bit + carry, add/sub or concat
//!          └────────┘
//! ```
//!
//! All arithmetic is unsigned and wrapping. The post adder is 11 bits wide and
//! bit 10 comes out as carry (or borrow, when subtracting).

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::decode::LaneOperands;
use crate::decode::control::{ControlWord, Lane, LaneControl, MulSel, PostControl};
use crate::nibble::Nibble;

const PRE_MASK: u8 = 0x1F;
const PRODUCT_MASK: u16 = 0x3FF;
const POST_WIDTH: u8 = 11;

/// Output of one execution: a 10-bit value and the carry out of the post adder.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AluResult {
    pub value: u16,
    pub carry: bool,
}

impl AluResult {
    pub const VALUE_WIDTH: u8 = 10;

    /// `value` is truncated to 10 bits.
    #[must_use]
    pub const fn new(value: u16, carry: bool) -> Self {
        Self {
            value: value & PRODUCT_MASK,
            carry,
        }
    }
}

/// `!pre_en` forwards operand 0, otherwise `op0 ± op1` over 5 bits.
#[must_use]
pub fn pre_stage(op0: Nibble, op1: Nibble, control: LaneControl) -> u8 {
    let (a, b) = (u8::from(op0), u8::from(op1));

    if !control.pre_en {
        return a;
    }

    let sum = if control.pre_sub {
        a.wrapping_sub(b)
    } else {
        a + b
    };
    sum & PRE_MASK
}

/// Second multiplier input of a lane.
///
/// `cross` is operand 1 of the other lane, the "c" of the interpolations.
#[must_use]
pub fn select_multiplicand(
    sel: MulSel,
    (op0, op1): (Nibble, Nibble),
    own_pre: u8,
    cross: Nibble,
) -> u8 {
    match sel {
        MulSel::Operand0 => op0.into(),
        MulSel::Operand1 => op1.into(),
        MulSel::OwnPre => own_pre & PRE_MASK,
        MulSel::Cross => cross.into(),
        MulSel::One => 1,
        MulSel::Reserved(_) => 0,
    }
}

/// `m0 × m1` over 10 bits, or both inputs packed side by side when the
/// multiplier is off.
#[must_use]
pub fn mul_stage(m0: u8, m1: u8, mul_en: bool) -> u16 {
    let (m0, m1) = (u16::from(m0 & PRE_MASK), u16::from(m1 & PRE_MASK));

    if mul_en {
        (m0 * m1) & PRODUCT_MASK
    } else {
        (m0 << 5) | m1
    }
}

/// Combines the two lane products.
///
/// Disabled, the low 5 bits of each product are concatenated (X high). Enabled,
/// `x ± second` is computed over 11 bits where `second` is the Y product, or
/// zero when the control word asks for it.
#[must_use]
pub fn post_stage(x: u16, y: u16, control: PostControl) -> AluResult {
    if !control.en {
        let value = ((x & u16::from(PRE_MASK)) << 5) | (y & u16::from(PRE_MASK));
        return AluResult::new(value, false);
    }

    let second = if control.zero_second { 0 } else { y & PRODUCT_MASK };
    let x = x & PRODUCT_MASK;
    let wide = if control.sub {
        x.wrapping_sub(second)
    } else {
        x + second
    }
    .truncated(POST_WIDTH);

    AluResult::new(wide, wide.get_bit(AluResult::VALUE_WIDTH))
}

fn lane_product(operands: &LaneOperands, control: ControlWord, lane: Lane) -> u16 {
    let lane_control = control.lane(lane);
    let (op0, op1) = operands.of(lane);
    let (_, cross) = operands.of(lane.other());

    let pre = pre_stage(op0, op1, lane_control);
    let multiplicand = select_multiplicand(lane_control.mul_sel, (op0, op1), pre, cross);
    mul_stage(pre, multiplicand, lane_control.mul_en)
}

/// Runs the whole datapath for one instruction.
#[must_use]
pub fn execute(operands: &LaneOperands, control: ControlWord) -> AluResult {
    let x = lane_product(operands, control, Lane::X);
    let y = lane_product(operands, control, Lane::Y);
    post_stage(x, y, control.post())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::control::{PostOp, PreOp};
    use crate::decode::decode;
    use crate::decode::opcode::Opcode;
    use pretty_assertions::assert_eq;

    fn n(value: u8) -> Nibble {
        Nibble::try_from(value).unwrap()
    }

    fn run(opcode: Opcode, a1: u8, a2: u8, b1: u8, b2: u8) -> AluResult {
        let operands = LaneOperands {
            x0: n(a1),
            x1: n(a2),
            y0: n(b1),
            y1: n(b2),
        };
        execute(&operands, decode(opcode))
    }

    fn lane(pre_en: bool, pre_sub: bool) -> LaneControl {
        LaneControl {
            pre_en,
            pre_sub,
            mul_en: false,
            mul_sel: MulSel::Operand1,
        }
    }

    #[test]
    fn pre_stage_passthrough() {
        assert_eq!(pre_stage(n(9), n(3), lane(false, true)), 9);
    }

    #[test]
    fn pre_stage_add_and_sub() {
        assert_eq!(pre_stage(n(15), n(15), lane(true, false)), 30);
        assert_eq!(pre_stage(n(5), n(2), lane(true, true)), 3);
        assert_eq!(pre_stage(n(2), n(5), lane(true, true)), 0b11101);
        assert_eq!(pre_stage(n(0), n(15), lane(true, true)), 17);
    }

    #[test]
    fn multiplicand_selection() {
        let ops = (n(3), n(7));
        assert_eq!(select_multiplicand(MulSel::Operand0, ops, 21, n(9)), 3);
        assert_eq!(select_multiplicand(MulSel::Operand1, ops, 21, n(9)), 7);
        assert_eq!(select_multiplicand(MulSel::OwnPre, ops, 21, n(9)), 21);
        assert_eq!(select_multiplicand(MulSel::Cross, ops, 21, n(9)), 9);
        assert_eq!(select_multiplicand(MulSel::One, ops, 21, n(9)), 1);
        for bits in 5..=7 {
            assert_eq!(select_multiplicand(MulSel::from_bits(bits), ops, 21, n(9)), 0);
        }
    }

    #[test]
    fn mul_stage_packs_when_disabled() {
        assert_eq!(mul_stage(0x1F, 0x01, false), 0x3E1);
        assert_eq!(mul_stage(3, 4, false), (3 << 5) | 4);
    }

    #[test]
    fn mul_stage_multiplies() {
        assert_eq!(mul_stage(31, 31, true), 961);
        assert_eq!(mul_stage(6, 7, true), 42);
        assert_eq!(mul_stage(0, 31, true), 0);
    }

    #[test]
    fn post_stage_concat() {
        let control = ControlWord::IDENTITY.post();
        assert_eq!(post_stage(0x3FF, 0x3E1, control), AluResult::new(0x3E1, false));
    }

    #[test]
    fn post_stage_carry_and_borrow() {
        let add = ControlWord::IDENTITY.with_post(PostOp::Add).post();
        assert_eq!(post_stage(961, 961, add), AluResult::new(1922 - 1024, true));

        let sub = ControlWord::IDENTITY.with_post(PostOp::Sub).post();
        assert_eq!(post_stage(1, 4, sub), AluResult::new(1021, true));
        assert_eq!(post_stage(4, 1, sub), AluResult::new(3, false));
    }

    #[test]
    fn post_stage_zero_second_input() {
        let control = ControlWord::IDENTITY
            .with_post(PostOp::Sub)
            .with_post_zero()
            .post();
        assert_eq!(post_stage(700, 300, control), AluResult::new(700, false));
    }

    #[test]
    fn noop_concatenates_second_operands() {
        assert_eq!(run(Opcode::Noop, 0x1, 0xA, 0x2, 0xB), AluResult::new((0xA << 5) | 0xB, false));
        assert_eq!(run(Opcode::Noop, 0xF, 0x0, 0xF, 0x0), AluResult::new(0, false));
    }

    #[test]
    fn reference_results() {
        assert_eq!(run(Opcode::Dot2, 3, 2, 1, 4), AluResult::new(10, false));
        assert_eq!(run(Opcode::Vadd2, 5, 3, 2, 7), AluResult::new(265, false));
        assert_eq!(run(Opcode::Vsub2, 5, 2, 9, 4), AluResult::new(101, false));
        assert_eq!(run(Opcode::Dist2, 5, 2, 9, 6), AluResult::new(0, false));
        assert_eq!(run(Opcode::Diff2, 4, 3, 2, 1), AluResult::new(10, false));
    }

    #[test]
    fn diff2_underflow_wraps_with_borrow() {
        assert_eq!(run(Opcode::Diff2, 1, 1, 2, 2), AluResult::new(1021, true));
        assert_eq!(run(Opcode::Det2, 0, 0, 15, 15), AluResult::new(1024 - 225, true));
    }

    #[test]
    fn dot2_stays_within_ten_bits() {
        assert_eq!(run(Opcode::Dot2, 15, 15, 15, 15), AluResult::new(450, false));
        // The multiplier inputs are 4-bit here, so DOT2 never leaves 10 bits.
        assert_eq!(run(Opcode::Sumsq, 15, 15, 15, 15), run(Opcode::Dot2, 15, 15, 15, 15));
    }

    #[test]
    fn dist2_squares_wrapped_differences() {
        // (2 - 5) mod 32 = 29, 29² mod 1024 = 841
        assert_eq!(run(Opcode::Dist2, 2, 5, 0, 0), AluResult::new(841, false));
        assert_eq!(run(Opcode::Dist2, 0, 0, 3, 0), AluResult::new(1024 - 9, true));
    }

    #[test]
    fn poly_adds_packed_pairs() {
        let expected = ((((3 + 4) & 0x1F) << 5) | 4) + ((5 << 5) | 6);
        assert_eq!(run(Opcode::Poly, 3, 4, 5, 6), AluResult::new(expected, false));

        let big = ((30 << 5) | 15) + ((15 << 5) | 15);
        assert_eq!(run(Opcode::Poly, 15, 15, 15, 15), AluResult::new(big, true));
    }

    #[test]
    fn scmul_keeps_low_product_bits() {
        // 7·5 = 35 -> 3, 2·3 = 6
        assert_eq!(run(Opcode::Scmul, 7, 5, 2, 3), AluResult::new((3 << 5) | 6, false));
    }

    #[test]
    fn interpolations() {
        // LERPX: a1 + a2·(b1 - b2)
        assert_eq!(run(Opcode::LerpX, 4, 3, 9, 2), AluResult::new(4 + 3 * 7, false));
        // b1 - b2 wraps to 31
        assert_eq!(run(Opcode::LerpX, 1, 2, 0, 1), AluResult::new(1 + 2 * 31, false));

        // LERPY: b1 + b2·(a1 - a2)
        assert_eq!(run(Opcode::LerpY, 9, 2, 4, 3), AluResult::new(4 + 3 * 7, false));
    }

    #[test]
    fn reserved_select_zeroes_product() {
        let control = ControlWord::IDENTITY
            .with_mul(Lane::X, MulSel::Reserved(6))
            .with_mul(Lane::Y, MulSel::Operand1)
            .with_pre(Lane::X, PreOp::Add)
            .with_post(PostOp::Add);
        let operands = LaneOperands {
            x0: n(9),
            x1: n(9),
            y0: n(2),
            y1: n(3),
        };
        assert_eq!(execute(&operands, control), AluResult::new(6, false));
    }

    #[test]
    fn result_value_is_truncated() {
        assert_eq!(AluResult::new(0xFFFF, false).value, 0x3FF);
    }
}
