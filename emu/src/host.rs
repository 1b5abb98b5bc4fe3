//! Simulation-side bus driver.
//!
//! [`SerialHost`] plays the host end of the nibble bus: it strobes an
//! instruction in, idles until the device reports a buffered result and
//! strobes the five result nibbles back out.

use crate::alu::AluResult;
use crate::instruction::{FRAME_NIBBLES, Instruction};
use crate::mau::{Mau, PinsIn};
use crate::nibble::Nibble;
use crate::tx::unpack_frame;

/// A result as read back over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readback {
    pub result: AluResult,
    /// Raw nibbles in the order they were received.
    pub nibbles: [Nibble; FRAME_NIBBLES],
    /// Carry pin sampled on the last read tick.
    pub carry_line: bool,
}

pub struct SerialHost {
    mau: Mau,
    timeout: u64,
}

impl SerialHost {
    /// Idle ticks [`Self::wait_result`] allows before giving up.
    pub const DEFAULT_TIMEOUT: u64 = 16;

    #[must_use]
    pub const fn new(mau: Mau) -> Self {
        Self::with_timeout(mau, Self::DEFAULT_TIMEOUT)
    }

    #[must_use]
    pub const fn with_timeout(mau: Mau, timeout: u64) -> Self {
        Self { mau, timeout }
    }

    #[must_use]
    pub const fn mau(&self) -> &Mau {
        &self.mau
    }

    pub const fn mau_mut(&mut self) -> &mut Mau {
        &mut self.mau
    }

    #[must_use]
    pub fn into_inner(self) -> Mau {
        self.mau
    }

    /// Strobes the five instruction nibbles in, opcode first.
    ///
    /// The device drops them if it still holds an instruction it could not
    /// hand to the ALU, i.e. when the previous result was never read.
    pub fn send_instruction(&mut self, instruction: Instruction) {
        tracing::trace!("host sends {instruction}");
        for nibble in instruction.to_nibbles() {
            self.mau.tick(PinsIn::write(nibble));
        }
    }

    /// Idles until a result is buffered. Returns the number of idle ticks.
    pub fn wait_result(&mut self) -> Result<u64, String> {
        let mut waited = 0;
        while !self.mau.status().result_valid {
            if waited == self.timeout {
                return Err(format!("no result after {waited} idle ticks"));
            }
            self.mau.tick(PinsIn::IDLE);
            waited += 1;
        }
        Ok(waited)
    }

    /// Strobes the five result nibbles out and releases the read strobe.
    pub fn read_result(&mut self) -> Result<Readback, String> {
        if !self.mau.status().result_valid {
            return Err("read requested with no result buffered".to_string());
        }

        let mut nibbles = [Nibble::ZERO; FRAME_NIBBLES];
        let mut carry_line = false;
        for nibble in &mut nibbles {
            let out = self.mau.tick(PinsIn::read());
            *nibble = out.miso;
            carry_line = out.carry;
        }
        self.mau.tick(PinsIn::IDLE);

        let readback = Readback {
            result: unpack_frame(nibbles),
            nibbles,
            carry_line,
        };
        tracing::trace!(
            "host read {} (carry {})",
            readback.result.value,
            readback.result.carry
        );
        Ok(readback)
    }

    /// Send, wait and read in one go.
    pub fn transact(&mut self, instruction: Instruction) -> Result<Readback, String> {
        self.send_instruction(instruction);
        self.wait_result()?;
        self.read_result()
    }
}
