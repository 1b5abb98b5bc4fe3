use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A 4-bit unsigned value, the transfer unit of the serial link and the width
/// of every instruction field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Nibble(u8);

impl Nibble {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(0xF);

    /// Keeps the 4 lowest bits of `value`, the way a 4-bit port samples a wider bus.
    #[must_use]
    pub const fn truncating(value: u8) -> Self {
        Self(value & 0xF)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// All sixteen values in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=0xF).map(Self)
    }
}

impl TryFrom<u8> for Nibble {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0xF {
            return Err(format!("0x{value:02X} does not fit in a nibble"));
        }

        Ok(Self(value))
    }
}

impl From<Nibble> for u8 {
    fn from(nibble: Nibble) -> Self {
        nibble.0
    }
}

impl From<Nibble> for u16 {
    fn from(nibble: Nibble) -> Self {
        Self::from(nibble.0)
    }
}

impl From<Nibble> for u32 {
    fn from(nibble: Nibble) -> Self {
        Self::from(nibble.0)
    }
}

impl Display for Nibble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn try_from_in_range() {
        for v in 0..=0xF_u8 {
            let n = Nibble::try_from(v).unwrap();
            assert_eq!(u8::from(n), v);
        }
    }

    #[test]
    fn try_from_out_of_range() {
        assert_eq!(
            Nibble::try_from(0x10),
            Err("0x10 does not fit in a nibble".to_string())
        );
        assert!(Nibble::try_from(0xFF).is_err());
    }

    #[test]
    fn truncating_drops_high_bits() {
        assert_eq!(Nibble::truncating(0xAB), Nibble::try_from(0xB).unwrap());
        assert_eq!(Nibble::truncating(0x10), Nibble::ZERO);
    }

    #[test]
    fn all_values() {
        let all: Vec<u8> = Nibble::all().map(u8::from).collect();
        assert_eq!(all, (0..=15).collect::<Vec<u8>>());
    }

    #[test]
    fn display_is_hex_digit() {
        assert_eq!(Nibble::MAX.to_string(), "F");
        assert_eq!(Nibble::truncating(7).to_string(), "7");
    }
}
