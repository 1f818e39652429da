//! Arithmetic/logic unit and ALU operand resolution.

use super::helpers::{low_byte, read_operand, write_operand};
use crate::encoding::{AluFunction, Destination, Source, Width};
use crate::CoreState;

/// Computes `function` over `op1` and `op2`, wrapping to `width`.
///
/// `INC`, `DEC` and `NOT` ignore `op2`. No flags are produced.
#[must_use]
pub const fn compute(op1: u16, op2: u16, function: AluFunction, width: Width) -> u16 {
    let result = match function {
        AluFunction::And => op1 & op2,
        AluFunction::Or => op1 | op2,
        AluFunction::Xor => op1 ^ op2,
        AluFunction::Add => op1.wrapping_add(op2),
        AluFunction::Sub => op1.wrapping_sub(op2),
        AluFunction::Inc => op1.wrapping_add(1),
        AluFunction::Dec => op1.wrapping_sub(1),
        AluFunction::Not => !op1,
    };
    result & width.mask()
}

/// Width an ALU operation computes at.
///
/// `MAR` is always operated on as a whole 16-bit register, even when `ACC`
/// supplies the second operand.
#[must_use]
pub const fn operating_width(destination: Destination, source: Source) -> Width {
    match destination {
        Destination::MarRegister => Width::Word,
        _ => Width::for_operands(destination, source),
    }
}

/// Reads the first operand through the destination mapping.
#[must_use]
pub fn read_destination(state: &CoreState, destination: Destination, width: Width) -> u16 {
    match destination {
        Destination::IndirectMar => read_operand(&state.memory, state.regs.mar(), width),
        Destination::Accumulator => u16::from(state.regs.acc()),
        Destination::MarRegister => state.regs.mar(),
        Destination::Absolute => read_operand(&state.memory, state.latch.destination, width),
    }
}

/// Reads the second operand through the source mapping.
#[must_use]
pub fn read_source(state: &CoreState, source: Source, width: Width) -> u16 {
    match source {
        Source::IndirectMar => read_operand(&state.memory, state.regs.mar(), width),
        Source::Accumulator => u16::from(state.regs.acc()),
        Source::Immediate => match width {
            Width::Byte => u16::from(state.latch.msb),
            Width::Word => state.latch.word(),
        },
        Source::Absolute => read_operand(&state.memory, state.latch.word(), width),
    }
}

/// Writes `result` back through the destination mapping.
pub fn save_result(state: &mut CoreState, destination: Destination, result: u16, width: Width) {
    match destination {
        Destination::IndirectMar => {
            let addr = state.regs.mar();
            write_operand(&mut state.memory, addr, result, width);
        }
        Destination::Accumulator => state.regs.set_acc(low_byte(result)),
        Destination::MarRegister => state.regs.set_mar(result),
        Destination::Absolute => {
            let addr = state.latch.destination;
            write_operand(&mut state.memory, addr, result, width);
        }
    }
}
