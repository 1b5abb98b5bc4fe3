#![allow(dead_code)]

use emu::{Instruction, Opcode};

/// Closed-form results of every opcode, written from the opcode table rather
/// than from the datapath stages.
pub fn expected(instruction: &Instruction) -> (u16, bool) {
    let a1 = u32::from(instruction.a1);
    let a2 = u32::from(instruction.a2);
    let b1 = u32::from(instruction.b1);
    let b2 = u32::from(instruction.b2);

    let wrap5 = |v: u32| v & 0x1F;
    let concat = |hi: u32, lo: u32| (((hi & 0x1F) << 5) | (lo & 0x1F), false);
    let add = |x: u32, y: u32| split(x + y);
    let sub = |x: u32, y: u32| split(x.wrapping_sub(y));

    let (value, carry) = match instruction.opcode {
        Opcode::Noop => concat(a2, b2),
        Opcode::Dot2 | Opcode::Wsum | Opcode::Proju | Opcode::Sumsq | Opcode::Scsum => {
            add(a1 * a2, b1 * b2)
        }
        Opcode::Vadd2 => concat(a1 + a2, b1 + b2),
        Opcode::Vsub2 => concat(a1.wrapping_sub(a2), b1.wrapping_sub(b2)),
        Opcode::Diff2 | Opcode::Det2 | Opcode::Diffsq => sub(a1 * a2, b1 * b2),
        Opcode::Dist2 => {
            let dx = wrap5(a1.wrapping_sub(a2));
            let dy = wrap5(b1.wrapping_sub(b2));
            sub((dx * dx) & 0x3FF, (dy * dy) & 0x3FF)
        }
        Opcode::Poly => add((wrap5(a1 + a2) << 5) | a2, (b1 << 5) | b2),
        Opcode::Scmul => concat(a1 * a2, b1 * b2),
        Opcode::LerpX => add(a1, a2 * wrap5(b1.wrapping_sub(b2))),
        Opcode::LerpY => add(b2 * wrap5(a1.wrapping_sub(a2)), b1),
    };

    (value as u16, carry)
}

fn split(wide: u32) -> (u32, bool) {
    let wide = wide & 0x7FF;
    (wide & 0x3FF, wide & 0x400 != 0)
}

pub fn instruction(opcode: Opcode, a1: u8, a2: u8, b1: u8, b2: u8) -> Instruction {
    Instruction::from_operands(opcode, a1, a2, b1, b2).unwrap()
}
