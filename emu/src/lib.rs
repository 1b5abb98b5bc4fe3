#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

#[allow(clippy::cast_possible_truncation)]
pub mod alu;
#[allow(clippy::cast_possible_truncation)]
pub mod decode;
pub mod host;
#[allow(clippy::cast_possible_truncation)]
pub mod instruction;
#[allow(clippy::module_name_repetitions)]
pub mod mau;
pub mod nibble;
pub mod rx;
pub mod trace;
#[allow(clippy::cast_possible_truncation)]
pub mod tx;

pub use alu::AluResult;
pub use decode::opcode::Opcode;
pub use host::{Readback, SerialHost};
pub use instruction::Instruction;
pub use mau::{Mau, MauConfig, MauStatus, PinsIn, PinsOut};
pub use nibble::Nibble;
