use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Bit helpers shared by the control word, the framers and the datapath.
/// Indexes go from lsb to msb (right to left), as in the hardware bit vectors.
pub trait Bits
where
    Self: Copy + Sized + Into<u128> + TryFrom<u128>,
    <Self as TryFrom<u128>>::Error: Debug,
{
    const WIDTH: u8 = (size_of::<Self>() * 8) as u8;

    fn get_bit(self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < Self::WIDTH);
        let value: u128 = self.into();
        (value >> bit_idx) & 1 == 1
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        debug_assert!(bit_idx < Self::WIDTH);
        let mut bitwise: u128 = (*self).into();
        let mask = 1 << bit_idx;
        if value {
            bitwise |= mask;
        } else {
            bitwise &= !mask;
        }
        *self = Self::from_u128(bitwise);
    }

    /// Extracts `bits_range` and moves it down to bit 0.
    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let mask = width_mask(bits_range.len() as u32) << start;
        let value: u128 = self.into();

        Self::from_u128((value & mask) >> start)
    }

    /// Replaces `bits_range` with the low bits of `value`; extra bits of `value` are dropped.
    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: u128) {
        let start = *bits_range.start();
        let field = width_mask(bits_range.len() as u32);
        let bitwise: u128 = (*self).into();
        let cleared = bitwise & !(field << start);

        *self = Self::from_u128(cleared | ((value & field) << start));
    }

    /// Keeps only the `width` lowest bits, like assigning to a narrower vector.
    fn truncated(self, width: u8) -> Self {
        let value: u128 = self.into();
        Self::from_u128(value & width_mask(u32::from(width)))
    }

    #[doc(hidden)]
    fn from_u128(value: u128) -> Self {
        let size_mask = width_mask(u32::from(Self::WIDTH));
        // Cannot fail, the value has been masked to the size of `Self`.
        <Self as TryFrom<u128>>::try_from(value & size_mask)
            .unwrap_or_else(|_| unreachable!("masked value always fits"))
    }
}

const fn width_mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1 << width) - 1
    }
}

impl Bits for u32 {}
impl Bits for u16 {}
impl Bits for u8 {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::Rng;

    #[test]
    fn get_bit() {
        let b = 0b10_1100_1110_u16;
        assert!(b.get_bit(1));
        assert!(!b.get_bit(0));
        assert!(b.get_bit(2));
        assert!(b.get_bit(9));
        assert!(!b.get_bit(15));
    }

    #[test]
    fn set_bit() {
        let mut b = 0b110_0110_u8;
        b.set_bit(0, true);
        b.set_bit(1, true);
        b.set_bit(2, false);
        b.set_bit(3, false);
        assert_eq!(b, 0b110_0011);
    }

    #[test]
    #[should_panic]
    fn invalid_index() {
        let b = 0u8;
        b.get_bit(8);
    }

    #[test]
    fn get_bits() {
        let b = 0b10_1100_1110_u16;
        assert_eq!(b.get_bits(0..=3), 0b1110);
        assert_eq!(b.get_bits(1..=1), 0b1);
        assert_eq!(b.get_bits(4..=7), 0b1100);
        assert_eq!(b.get_bits(8..=9), 0b10);
        assert_eq!(b.get_bits(0..=15), 0b10_1100_1110);
        assert_eq!(b.get_bits(12..=15), 0b0);
    }

    #[test]
    fn set_bits() {
        let mut b = 0b0111_1111_1111_1111_u16;
        b.set_bits(9..=11, 0b010);
        assert_eq!(b, 0b0111_0101_1111_1111);

        // Wider values are cut to the field width.
        let mut b = 0_u8;
        b.set_bits(0..=2, 0b1_1101);
        assert_eq!(b, 0b101);
    }

    #[test]
    fn truncated() {
        assert_eq!(0x7FD_u16.truncated(10), 0x3FD);
        assert_eq!(0xFF_u8.truncated(5), 0x1F);
        assert_eq!(0xAB_u8.truncated(8), 0xAB);
    }

    #[test]
    fn set_then_get_random_fields() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let start = rng.gen_range(0..=12_u8);
            let end = rng.gen_range(start..=15);
            let value = rng.gen_range(0..=u16::MAX);

            let mut b = rng.gen_range(0..=u16::MAX);
            b.set_bits(start..=end, u128::from(value));
            let expected = value.truncated(end - start + 1);
            assert_eq!(b.get_bits(start..=end), expected);
        }
    }
}
