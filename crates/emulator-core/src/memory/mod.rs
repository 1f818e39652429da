//! Flat 64 KiB memory model and big-endian word helpers.

/// Bounds-checked reads and block writes.
pub mod access;

pub use access::{read_byte_checked, write_block};

/// Size in bytes of the flat architectural address space (64 KiB).
pub const ADDRESS_SPACE_BYTES: usize = u16::MAX as usize + 1;

/// Backing store sized so that every `u16` address is in bounds.
pub type AddressSpace = [u8; ADDRESS_SPACE_BYTES];

/// Allocates a canonical zeroed 64 KiB address-space backing store.
#[must_use]
pub fn new_address_space() -> Box<AddressSpace> {
    Box::new([0; ADDRESS_SPACE_BYTES])
}

/// Reads a big-endian word at `addr`; the second byte wraps past `0xFFFF`.
#[must_use]
pub fn read_u16_be(memory: &AddressSpace, addr: u16) -> u16 {
    let hi = memory[usize::from(addr)];
    let lo = memory[usize::from(addr.wrapping_add(1))];
    u16::from_be_bytes([hi, lo])
}

/// Writes a big-endian word at `addr`; the second byte wraps past `0xFFFF`.
pub fn write_u16_be(memory: &mut AddressSpace, addr: u16, value: u16) {
    let [hi, lo] = value.to_be_bytes();
    memory[usize::from(addr)] = hi;
    memory[usize::from(addr.wrapping_add(1))] = lo;
}
