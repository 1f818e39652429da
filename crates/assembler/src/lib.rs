//! Assembler library for the Accum accumulator machine.

#[cfg(test)]
use tempfile as _;
use tracing_subscriber as _;

/// Top-level two-pass assembler pipeline.
pub mod assembler;
/// Instruction and directive encoding.
pub mod encoder;
/// Unified error type for the pipeline.
pub mod errors;
/// Mnemonic table.
pub mod mnemonic;
/// Source line parser and instruction form selection.
pub mod parser;
/// Symbol table and pass-1 address assignment.
pub mod symbols;

pub use assembler::{assemble, assemble_file, Assembly, ListingEntry};
pub use errors::{AssembleError, AssembleErrorKind};
