//! # ALU execution core
//!
//! A single-cycle datapath ([`datapath`]) behind a one-slot result buffer.
//!
//! The slot is the only storage between decode and TX. The ALU takes a new
//! command only when the slot is empty, or when TX drains it on the same
//! tick. While a result waits to be read the ALU stays not-ready and the
//! instruction behind it waits in RX.

pub mod datapath;

use serde::{Deserialize, Serialize};

use crate::decode::Command;

pub use self::datapath::{AluResult, execute};

/// What happened in the ALU on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AluStepOutput {
    /// Result computed for the command accepted this tick.
    pub executed: Option<AluResult>,
    /// Result released to TX this tick.
    pub drained: Option<AluResult>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alu {
    slot: Option<AluResult>,
}

impl Alu {
    /// Ready when the slot is empty or is being drained this tick.
    #[must_use]
    pub const fn is_ready(&self, drain: bool) -> bool {
        self.slot.is_none() || drain
    }

    /// The buffered result, if any. This is the "valid" side towards TX.
    #[must_use]
    pub const fn result(&self) -> Option<AluResult> {
        self.slot
    }

    pub fn step(&mut self, command: Option<Command>, drain: bool) -> AluStepOutput {
        let mut output = AluStepOutput::default();

        if drain {
            output.drained = self.slot.take();
            if let Some(result) = output.drained {
                tracing::debug!("result {} (carry {}) drained", result.value, result.carry);
            }
        }

        if let Some(command) = command {
            if let Some(pending) = self.slot {
                // Decode only fires on ready, this is a wiring bug upstream.
                tracing::debug!(
                    "dropping {} while result {} is still buffered",
                    command.instruction,
                    pending.value
                );
                return output;
            }

            let result = execute(&command.operands, command.control);
            tracing::debug!(
                "executed {} -> {} (carry {})",
                command.instruction,
                result.value,
                result.carry
            );
            self.slot = Some(result);
            output.executed = Some(result);
        }

        output
    }

    pub fn reset(&mut self) {
        self.slot = None;
    }
}
