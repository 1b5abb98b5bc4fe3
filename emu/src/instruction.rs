use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::decode::opcode::Opcode;
use crate::nibble::Nibble;

/// Number of nibbles in an instruction (and in a result frame).
pub const FRAME_NIBBLES: usize = 5;

/// A complete 20-bit instruction as reassembled by the RX framer.
///
/// ```text
///  19   16 15   12 11    8 7     4 3     0
/// ┌───────┬───────┬───────┬───────┬───────┐
/// │opcode │  a1   │  a2   │  b1   │  b2   │
/// └───────┴───────┴───────┴───────┴───────┘
/// ```
///
/// On the wire the opcode nibble travels first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub a1: Nibble,
    pub a2: Nibble,
    pub b1: Nibble,
    pub b2: Nibble,
}

impl Instruction {
    #[must_use]
    pub const fn new(opcode: Opcode, a1: Nibble, a2: Nibble, b1: Nibble, b2: Nibble) -> Self {
        Self {
            opcode,
            a1,
            a2,
            b1,
            b2,
        }
    }

    /// Builds an instruction from raw operand values, failing if any of them
    /// does not fit in 4 bits.
    pub fn from_operands(opcode: Opcode, a1: u8, a2: u8, b1: u8, b2: u8) -> Result<Self, String> {
        Ok(Self::new(
            opcode,
            a1.try_into()?,
            a2.try_into()?,
            b1.try_into()?,
            b2.try_into()?,
        ))
    }

    /// Nibbles in transmission order.
    #[must_use]
    pub const fn to_nibbles(self) -> [Nibble; FRAME_NIBBLES] {
        [self.opcode.nibble(), self.a1, self.a2, self.b1, self.b2]
    }

    #[must_use]
    pub fn from_nibbles(nibbles: [Nibble; FRAME_NIBBLES]) -> Self {
        let [opcode, a1, a2, b1, b2] = nibbles;
        Self::new(opcode.into(), a1, a2, b1, b2)
    }

    /// Packed 20-bit form, opcode in the most significant nibble.
    #[must_use]
    pub fn to_bits(self) -> u32 {
        self.to_nibbles()
            .iter()
            .fold(0, |word, nibble| (word << 4) | u32::from(*nibble))
    }

    pub fn from_bits(word: u32) -> Result<Self, String> {
        if word > 0xF_FFFF {
            return Err(format!("0x{word:X} is wider than an instruction (20 bits)"));
        }

        let field = |idx: u8| Nibble::truncating(word.get_bits(idx * 4..=idx * 4 + 3) as u8);
        Ok(Self::from_nibbles([
            field(4),
            field(3),
            field(2),
            field(1),
            field(0),
        ]))
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} a=({}, {}) b=({}, {})",
            self.opcode,
            u8::from(self.a1),
            u8::from(self.a2),
            u8::from(self.b1),
            u8::from(self.b2)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nibble_order_starts_with_opcode() {
        let instruction = Instruction::from_operands(Opcode::Det2, 0xA, 0xE, 0x4, 0x8).unwrap();
        let nibbles: Vec<u8> = instruction.to_nibbles().iter().map(|n| u8::from(*n)).collect();
        assert_eq!(nibbles, vec![0x9, 0xA, 0xE, 0x4, 0x8]);
    }

    #[test]
    fn packed_word() {
        let instruction = Instruction::from_operands(Opcode::Det2, 0xA, 0xE, 0x4, 0x8).unwrap();
        assert_eq!(instruction.to_bits(), 0x9_AE48);
        assert_eq!(Instruction::from_bits(0x9_AE48), Ok(instruction));
    }

    #[test]
    fn from_bits_rejects_wide_words() {
        assert!(Instruction::from_bits(0x10_0000).is_err());
        assert!(Instruction::from_bits(0xF_FFFF).is_ok());
    }

    #[test]
    fn from_operands_rejects_wide_values() {
        assert_eq!(
            Instruction::from_operands(Opcode::Dot2, 1, 2, 16, 4),
            Err("0x10 does not fit in a nibble".to_string())
        );
    }

    #[test]
    fn display() {
        let instruction = Instruction::from_operands(Opcode::Vadd2, 5, 3, 2, 7).unwrap();
        assert_eq!(instruction.to_string(), "VADD2 a=(5, 3) b=(2, 7)");
    }
}
