//! Width-aware memory operand access shared by the execution units.

use crate::encoding::Width;
use crate::memory::{read_u16_be, write_u16_be, AddressSpace};

/// Reads a byte or a big-endian word at `addr`.
#[must_use]
pub fn read_operand(memory: &AddressSpace, addr: u16, width: Width) -> u16 {
    match width {
        Width::Byte => u16::from(memory[usize::from(addr)]),
        Width::Word => read_u16_be(memory, addr),
    }
}

/// Writes the low byte or the full big-endian word of `value` at `addr`.
pub fn write_operand(memory: &mut AddressSpace, addr: u16, value: u16, width: Width) {
    tracing::trace!(addr, value, ?width, "memory write");
    match width {
        Width::Byte => memory[usize::from(addr)] = low_byte(value),
        Width::Word => write_u16_be(memory, addr, value),
    }
}

/// Low 8 bits of a word.
#[must_use]
pub const fn low_byte(value: u16) -> u8 {
    value.to_be_bytes()[1]
}
