//! # Result framer (TX)
//!
//! Clocks a buffered result out as five nibbles, one per read-strobed tick.
//!
//! | nibble | bits 3..0                               |
//! |--------|-----------------------------------------|
//! | 0      | `value[3:0]`                            |
//! | 1      | `value[7:4]`                            |
//! | 2      | `value[9:8]`, carry, `0`                |
//! | 3      | reserved, `0`                           |
//! | 4      | reserved, `0`                           |
//!
//! The frame is captured from the ALU slot on the first read tick and the
//! slot is released (consumed) on the tick the last nibble goes out.
//! Releasing the read strobe earlier abandons the frame; the result stays in
//! the ALU and is framed again on the next read.

use serde::{Deserialize, Serialize};

use crate::alu::AluResult;
use crate::bitwise::Bits;
use crate::instruction::FRAME_NIBBLES;
use crate::nibble::Nibble;

const CARRY_BIT: u8 = 1;

/// Splits a result into its five wire nibbles.
#[must_use]
pub fn pack_frame(result: AluResult) -> [Nibble; FRAME_NIBBLES] {
    let value = result.value;
    let mut high = 0_u8;
    high.set_bits(2..=3, u128::from(value.get_bits(8..=9)));
    high.set_bit(CARRY_BIT, result.carry);

    [
        Nibble::truncating(value.get_bits(0..=3) as u8),
        Nibble::truncating(value.get_bits(4..=7) as u8),
        Nibble::truncating(high),
        Nibble::ZERO,
        Nibble::ZERO,
    ]
}

/// Reassembles a result from its wire nibbles. Padding and reserved bits are
/// ignored.
#[must_use]
pub fn unpack_frame(frame: [Nibble; FRAME_NIBBLES]) -> AluResult {
    let [low, mid, high, _, _] = frame.map(u8::from);
    let value = u16::from(low) | (u16::from(mid) << 4) | (u16::from(high.get_bits(2..=3)) << 8);
    AluResult::new(value, high.get_bit(CARRY_BIT))
}

/// Pins driven by TX on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TxStepOutput {
    pub miso: Nibble,
    /// Carry of the frame being clocked out.
    pub carry: bool,
    /// The last nibble went out, the ALU may release its slot.
    pub consumed: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFramer {
    frame: Option<AluResult>,
    position: usize,
}

impl ResultFramer {
    /// A frame is being clocked out.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.frame.is_some()
    }

    /// Index of the next nibble to drive.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Advances the framer by one tick. `pending` is the ALU slot as seen
    /// on this tick.
    pub fn step(&mut self, read: bool, pending: Option<AluResult>) -> TxStepOutput {
        if !read {
            if self.frame.is_some() {
                tracing::debug!(
                    "read released after {} nibbles, frame abandoned",
                    self.position
                );
            }
            self.frame = None;
            self.position = 0;
            return TxStepOutput::default();
        }

        let result = match self.frame {
            Some(result) => result,
            None => {
                let Some(result) = pending else {
                    tracing::debug!("read strobed with no result available");
                    return TxStepOutput::default();
                };
                tracing::debug!("tx framing {} (carry {})", result.value, result.carry);
                self.frame = Some(result);
                result
            }
        };

        let miso = pack_frame(result)[self.position];
        tracing::trace!("tx nibble {miso} from position {}", self.position);
        self.position += 1;

        let consumed = self.position == FRAME_NIBBLES;
        if consumed {
            self.frame = None;
            self.position = 0;
        }

        TxStepOutput {
            miso,
            carry: result.carry,
            consumed,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Checks the invariants a restored framer must hold.
    pub fn validate(&self) -> Result<(), String> {
        if self.position >= FRAME_NIBBLES {
            return Err(format!("tx position {} out of range", self.position));
        }
        if self.frame.is_none() && self.position != 0 {
            return Err(format!("idle tx at position {}", self.position));
        }
        Ok(())
    }
}
