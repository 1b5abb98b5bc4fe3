//! # Decode stage
//!
//! Turns a framed [`Instruction`] into what the datapath needs: the four lane
//! operands and the [`ControlWord`] selected by the opcode. Decoding is
//! purely combinational, nothing is stored between ticks.
//!
//! ## Operand routing
//!
//! Routing is fixed for every opcode:
//!
//! ```text
//! a1 ──► X0    a2 ──► X1    b1 ──► Y0    b2 ──► Y1
//! ```
//!
//! ## Opcode table
//!
//! | Op     | Hex | Control                              | Result                          |
//! |--------|-----|--------------------------------------|---------------------------------|
//! | NOOP   | 0x0 | identity                             | `X1 << 5 \| Y1`                 |
//! | DOT2   | 0x1 | mul by operand 1, post add           | `X0·X1 + Y0·Y1`                 |
//! | WSUM   | 0x2 | as DOT2                              | `X0·X1 + Y0·Y1`                 |
//! | PROJU  | 0x3 | as DOT2                              | `X0·X1 + Y0·Y1`                 |
//! | SUMSQ  | 0x4 | as DOT2                              | `X0·X1 + Y0·Y1`                 |
//! | SCSUM  | 0x5 | as DOT2                              | `X0·X1 + Y0·Y1`                 |
//! | VADD2  | 0x6 | pre add, mul by one, concat          | `{X0+X1, Y0+Y1}`                |
//! | VSUB2  | 0x7 | pre sub, mul by one, concat          | `{X0-X1, Y0-Y1}`                |
//! | DIFF2  | 0x8 | mul by operand 1, post sub           | `X0·X1 - Y0·Y1`                 |
//! | DET2   | 0x9 | as DIFF2                             | `X0·X1 - Y0·Y1`                 |
//! | DIFFSQ | 0xA | as DIFF2                             | `X0·X1 - Y0·Y1`                 |
//! | DIST2  | 0xB | pre sub, square, post sub            | `(X0-X1)² - (Y0-Y1)²`           |
//! | POLY   | 0xC | X pre add, multipliers off, post add | `{X0+X1, X1} + {Y0, Y1}`        |
//! | SCMUL  | 0xD | mul by operand 1, concat             | `{X0·X1, Y0·Y1}`                |
//! | LERPX  | 0xE | X ×1, Y pre sub ×c, post add         | `X0 + (Y0-Y1)·X1`               |
//! | LERPY  | 0xF | Y ×1, X pre sub ×c, post add         | `Y0 + (X0-X1)·Y1`               |
//!
//! `{a, b}` packs two 5-bit values into the 10-bit result.
//!
//! Several names promise more than the fabric does. DET2 would need the
//! operands crossed (`X0·Y1 - Y0·X1`), POLY never engages a multiplier, and the
//! WSUM/PROJU/SUMSQ/SCSUM family is plain DOT2. The table above is what the
//! hardware computes and is what this model reproduces.

pub mod control;
pub mod opcode;

use serde::{Deserialize, Serialize};

use crate::instruction::Instruction;
use crate::nibble::Nibble;

use self::control::{ControlWord, Lane, MulSel, PostOp, PreOp};
use self::opcode::Opcode;

/// Operands of the two lanes after routing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneOperands {
    pub x0: Nibble,
    pub x1: Nibble,
    pub y0: Nibble,
    pub y1: Nibble,
}

impl LaneOperands {
    /// `(operand 0, operand 1)` of `lane`.
    #[must_use]
    pub const fn of(&self, lane: Lane) -> (Nibble, Nibble) {
        match lane {
            Lane::X => (self.x0, self.x1),
            Lane::Y => (self.y0, self.y1),
        }
    }
}

impl From<&Instruction> for LaneOperands {
    fn from(instruction: &Instruction) -> Self {
        Self {
            x0: instruction.a1,
            x1: instruction.a2,
            y0: instruction.b1,
            y1: instruction.b2,
        }
    }
}

/// A decoded instruction, ready for the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub instruction: Instruction,
    pub operands: LaneOperands,
    pub control: ControlWord,
}

impl From<Instruction> for Command {
    fn from(instruction: Instruction) -> Self {
        Self {
            instruction,
            operands: LaneOperands::from(&instruction),
            control: decode(instruction.opcode),
        }
    }
}

const DOT: ControlWord = ControlWord::IDENTITY
    .with_mul(Lane::X, MulSel::Operand1)
    .with_mul(Lane::Y, MulSel::Operand1)
    .with_post(PostOp::Add);

const DIFF: ControlWord = ControlWord::IDENTITY
    .with_mul(Lane::X, MulSel::Operand1)
    .with_mul(Lane::Y, MulSel::Operand1)
    .with_post(PostOp::Sub);

/// Control word of `opcode`. Total over the 4-bit opcode space.
#[must_use]
pub const fn decode(opcode: Opcode) -> ControlWord {
    use Opcode::*;
    match opcode {
        Noop => ControlWord::IDENTITY,
        Dot2 | Wsum | Proju | Sumsq | Scsum => DOT,
        Vadd2 => ControlWord::IDENTITY
            .with_pre(Lane::X, PreOp::Add)
            .with_mul(Lane::X, MulSel::One)
            .with_pre(Lane::Y, PreOp::Add)
            .with_mul(Lane::Y, MulSel::One),
        Vsub2 => ControlWord::IDENTITY
            .with_pre(Lane::X, PreOp::Sub)
            .with_mul(Lane::X, MulSel::One)
            .with_pre(Lane::Y, PreOp::Sub)
            .with_mul(Lane::Y, MulSel::One),
        Diff2 | Det2 | Diffsq => DIFF,
        Dist2 => ControlWord::IDENTITY
            .with_pre(Lane::X, PreOp::Sub)
            .with_mul(Lane::X, MulSel::OwnPre)
            .with_pre(Lane::Y, PreOp::Sub)
            .with_mul(Lane::Y, MulSel::OwnPre)
            .with_post(PostOp::Sub),
        Poly => ControlWord::IDENTITY
            .with_pre(Lane::X, PreOp::Add)
            .with_post(PostOp::Add),
        Scmul => ControlWord::IDENTITY
            .with_mul(Lane::X, MulSel::Operand1)
            .with_mul(Lane::Y, MulSel::Operand1),
        LerpX => ControlWord::IDENTITY
            .with_mul(Lane::X, MulSel::One)
            .with_pre(Lane::Y, PreOp::Sub)
            .with_mul(Lane::Y, MulSel::Cross)
            .with_post(PostOp::Add),
        LerpY => ControlWord::IDENTITY
            .with_pre(Lane::X, PreOp::Sub)
            .with_mul(Lane::X, MulSel::Cross)
            .with_mul(Lane::Y, MulSel::One)
            .with_post(PostOp::Add),
    }
}

/// Every opcode with its control word, in encoding order.
pub fn decode_table() -> impl Iterator<Item = (Opcode, ControlWord)> {
    Opcode::ALL.into_iter().map(|opcode| (opcode, decode(opcode)))
}

/// What the decode stage presents to the ALU on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOutput {
    /// Present only on the tick the handshake fires.
    pub command: Option<Command>,
    /// Mirrors the ALU ready back to RX.
    pub upstream_ready: bool,
}

/// Handshake glue between RX and the ALU.
///
/// A transfer happens on the tick where RX has a complete instruction
/// (valid) and the ALU can take it (ready). The stage itself holds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeStage;

impl DecodeStage {
    #[must_use]
    pub fn step(self, pending: Option<Instruction>, downstream_ready: bool) -> DecodeOutput {
        let command = pending.filter(|_| downstream_ready).map(|instruction| {
            let command = Command::from(instruction);
            tracing::debug!("decoded {instruction} -> control {}", command.control);
            command
        });

        DecodeOutput {
            command,
            upstream_ready: downstream_ready,
        }
    }
}
