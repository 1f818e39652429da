//! Architectural CPU state model primitives.

/// Register file and immediate latch.
pub mod registers;

pub use registers::{ImmediateLatch, RegisterFile, ACC_SIGN_BIT};
