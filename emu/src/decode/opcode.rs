use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::nibble::Nibble;

/// The sixteen operations of the accelerator, one per 4-bit opcode.
///
/// The names come from the operations the fabric was meant to provide. Some
/// of them share a control word and therefore compute the same thing, see
/// [`decode`](super::decode) for the realized behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Noop = 0x0,
    Dot2 = 0x1,
    Wsum = 0x2,
    Proju = 0x3,
    Sumsq = 0x4,
    Scsum = 0x5,
    Vadd2 = 0x6,
    Vsub2 = 0x7,
    Diff2 = 0x8,
    Det2 = 0x9,
    Diffsq = 0xA,
    Dist2 = 0xB,
    Poly = 0xC,
    Scmul = 0xD,
    LerpX = 0xE,
    LerpY = 0xF,
}

impl Opcode {
    pub const ALL: [Self; 16] = [
        Self::Noop,
        Self::Dot2,
        Self::Wsum,
        Self::Proju,
        Self::Sumsq,
        Self::Scsum,
        Self::Vadd2,
        Self::Vsub2,
        Self::Diff2,
        Self::Det2,
        Self::Diffsq,
        Self::Dist2,
        Self::Poly,
        Self::Scmul,
        Self::LerpX,
        Self::LerpY,
    ];

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Noop => "NOOP",
            Self::Dot2 => "DOT2",
            Self::Wsum => "WSUM",
            Self::Proju => "PROJU",
            Self::Sumsq => "SUMSQ",
            Self::Scsum => "SCSUM",
            Self::Vadd2 => "VADD2",
            Self::Vsub2 => "VSUB2",
            Self::Diff2 => "DIFF2",
            Self::Det2 => "DET2",
            Self::Diffsq => "DIFFSQ",
            Self::Dist2 => "DIST2",
            Self::Poly => "POLY",
            Self::Scmul => "SCMUL",
            Self::LerpX => "LERPX",
            Self::LerpY => "LERPY",
        }
    }

    #[must_use]
    pub const fn nibble(self) -> Nibble {
        Nibble::truncating(self as u8)
    }
}

impl From<Nibble> for Opcode {
    fn from(op_code: Nibble) -> Self {
        use Opcode::*;
        match op_code.value() {
            0x1 => Dot2,
            0x2 => Wsum,
            0x3 => Proju,
            0x4 => Sumsq,
            0x5 => Scsum,
            0x6 => Vadd2,
            0x7 => Vsub2,
            0x8 => Diff2,
            0x9 => Det2,
            0xA => Diffsq,
            0xB => Dist2,
            0xC => Poly,
            0xD => Scmul,
            0xE => LerpX,
            0xF => LerpY,
            // 0x0 and anything a 4-bit field cannot carry.
            _ => Noop,
        }
    }
}

impl From<Opcode> for Nibble {
    fn from(opcode: Opcode) -> Self {
        opcode.nibble()
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = String;

    /// Accepts a mnemonic (any case) or a numeric opcode (`0x9`, `9`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(opcode) = Self::ALL
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
        {
            return Ok(*opcode);
        }

        let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => s.parse::<u8>(),
        }
        .map_err(|_| format!("unknown opcode `{s}`"))?;

        Nibble::try_from(value).map(Self::from)
    }
}
