//! Execution dispatcher.
//!
//! Re-decodes the opcode latched in `IR` by the preceding fetch and routes it
//! to the ALU, the memory access unit or the branch unit.

mod alu;
mod branch;
mod helpers;
mod transfer;

pub use alu::{compute, operating_width, read_destination, read_source, save_result};
pub use branch::{branch, condition_holds};
pub use helpers::{read_operand, write_operand};
pub use transfer::{load, store};

use crate::decoder::{Decoder, Instruction};
use crate::encoding::Direction;
use crate::{CoreState, FaultCode};

/// Executes the instruction most recently fetched into `IR`.
///
/// Must run exactly once per fetch: it consumes the immediate latch.
///
/// # Errors
///
/// Returns [`FaultCode::UnresolvedAddress`] for a store through the
/// immediate-constant method. Every other opcode succeeds.
pub fn execute(state: &mut CoreState) -> Result<(), FaultCode> {
    match Decoder::decode(state.regs.ir()) {
        Instruction::Alu {
            function,
            destination,
            source,
        } => {
            let width = operating_width(destination, source);
            let op1 = read_destination(state, destination, width);
            let op2 = read_source(state, source, width);
            let result = compute(op1, op2, function, width);
            tracing::trace!(?function, op1, op2, result, "alu");
            save_result(state, destination, result, width);
            Ok(())
        }
        Instruction::Transfer {
            direction,
            register,
            method,
        } => match direction {
            Direction::Load => {
                load(state, register, method);
                Ok(())
            }
            Direction::Store => store(state, register, method),
        },
        Instruction::Branch { condition } => {
            let target = state.latch.word();
            branch(state, condition, target);
            Ok(())
        }
        Instruction::Unclassified => Ok(()),
    }
}
