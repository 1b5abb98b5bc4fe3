//! # Instruction framer (RX)
//!
//! Reassembles instructions from the write-strobed nibble stream:
//!
//! ```text
//! tick      t0      t1   t2   t3   t4
//! write   ──┐▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔┌──
//! mosi      │opcode│ a1 │ a2 │ b1 │ b2 │
//! ready   ─────────────────────────────┐▔▔▔▔ (until accepted)
//! ```
//!
//! A completed instruction is held until the decode stage accepts it. Any
//! nibble written in the meantime is dropped, and so is the rest of its
//! 5-nibble slot even if the held instruction gets accepted halfway through:
//! with the write strobe held, framing resumes on the next opcode boundary.
//! Releasing the write strobe rewinds the position to the opcode field.

use serde::{Deserialize, Serialize};

use crate::instruction::{FRAME_NIBBLES, Instruction};
use crate::nibble::Nibble;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionFramer {
    fields: [Nibble; FRAME_NIBBLES],
    position: usize,
    ready: bool,
    /// Nibbles dropped in the current slot of a write burst.
    dropped: usize,
}

impl InstructionFramer {
    /// The framed instruction while it waits to be accepted.
    #[must_use]
    pub fn instruction(&self) -> Option<Instruction> {
        self.ready.then(|| Instruction::from_nibbles(self.fields))
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Index of the field the next nibble lands in (0 = opcode).
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Advances the framer by one tick.
    ///
    /// `accepted` is the handshake of this tick: the instruction presented
    /// by [`Self::instruction`] was taken downstream. Returns the instruction
    /// completed by this tick's nibble, if any.
    pub fn step(&mut self, write: bool, mosi: Nibble, accepted: bool) -> Option<Instruction> {
        if accepted {
            self.ready = false;
        }

        if !write {
            if self.position != 0 {
                tracing::debug!(
                    "write released after {} nibbles, partial instruction abandoned",
                    self.position
                );
            }
            self.position = 0;
            self.dropped = 0;
            return None;
        }

        if self.ready || self.dropped != 0 {
            tracing::debug!(
                "nibble {mosi} dropped ({} of the slot), previous instruction not accepted in time",
                self.dropped + 1
            );
            self.dropped = (self.dropped + 1) % FRAME_NIBBLES;
            return None;
        }

        tracing::trace!("rx nibble {mosi} into field {}", self.position);
        self.fields[self.position] = mosi;
        self.position += 1;

        if self.position < FRAME_NIBBLES {
            return None;
        }

        self.position = 0;
        self.ready = true;
        let instruction = Instruction::from_nibbles(self.fields);
        tracing::debug!("framed {instruction}");
        Some(instruction)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Checks the invariants a restored framer must hold.
    pub fn validate(&self) -> Result<(), String> {
        if self.position >= FRAME_NIBBLES || self.dropped >= FRAME_NIBBLES {
            return Err(format!(
                "rx position {} / dropped {} out of range",
                self.position, self.dropped
            ));
        }
        if (self.ready || self.dropped != 0) && self.position != 0 {
            return Err(format!(
                "rx cannot be mid-instruction (position {}) while discarding",
                self.position
            ));
        }
        Ok(())
    }
}
