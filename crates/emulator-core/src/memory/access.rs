//! Bounds-checked access used at the edges of the address space.

use crate::FaultCode;

/// Reads the byte at `index`, faulting when it lies past the end of `memory`.
///
/// # Errors
///
/// Returns [`FaultCode::OutOfBounds`] when `index >= memory.len()`.
pub fn read_byte_checked(memory: &[u8], index: usize) -> Result<u8, FaultCode> {
    memory.get(index).copied().ok_or(FaultCode::OutOfBounds)
}

/// Copies `bytes` into `memory` starting at `origin`.
///
/// Nothing is written unless the whole block fits.
///
/// # Errors
///
/// Returns [`FaultCode::OutOfBounds`] when the block would extend past the
/// end of `memory`.
pub fn write_block(memory: &mut [u8], origin: u16, bytes: &[u8]) -> Result<(), FaultCode> {
    let start = usize::from(origin);
    let end = start
        .checked_add(bytes.len())
        .ok_or(FaultCode::OutOfBounds)?;
    let target = memory.get_mut(start..end).ok_or(FaultCode::OutOfBounds)?;
    target.copy_from_slice(bytes);
    Ok(())
}
