//! Core emulator crate for the Accum accumulator machine.
//!
//! The machine has 64 KiB of byte-addressable memory, an 8-bit accumulator
//! (`ACC`), a 16-bit memory address register (`MAR`), an instruction register
//! (`IR`) and a program counter (`PC`). A driver alternates [`fetch`] and
//! [`execute`]; [`CoreState::run`] does that until the halt opcode.

/// Address space allocation and checked/big-endian access helpers.
pub mod memory;
pub use memory::{
    new_address_space, read_byte_checked, read_u16_be, write_block, write_u16_be, AddressSpace,
    ADDRESS_SPACE_BYTES,
};

/// Host-facing machine API, run loop and trace hooks.
pub mod api;
pub use api::{
    CoreConfig, CoreState, RunOutcome, StepOutcome, StopReason, TraceEvent, TraceSink,
    DEFAULT_HALT_OPCODE,
};

/// Register file and immediate latch.
pub mod state;
pub use state::{ImmediateLatch, RegisterFile, ACC_SIGN_BIT};

/// Opcode family classification and field extraction.
pub mod encoding;
pub use encoding::{
    classify_family, is_arithmetic_logic, is_branch, is_memory_transfer, AluFunction,
    BranchCondition, Destination, Direction, InstructionFamily, Source, TransferMethod,
    TransferRegister, Width,
};

/// Typed decode and canonical re-encode of opcode bytes.
pub mod decoder;
pub use decoder::{trailing_byte_count, Decoder, Instruction, BRANCH_OPCODE_BASE};

/// Fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, FaultCode};

/// Operand fetch unit.
pub mod fetch;
pub use fetch::fetch;

/// ALU, memory access and branch units behind one dispatcher.
pub mod execute;
pub use execute::execute;

/// Disassembler producing assembler-compatible listings.
pub mod disasm;
pub use disasm::{disassemble_one, disassemble_range, DisassemblyRow};

/// Register and memory state report.
pub mod report;
pub use report::StateReport;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
