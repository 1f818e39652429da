//! Memory access unit: loads and stores between memory and `ACC`/`MAR`.

use crate::encoding::{TransferMethod, TransferRegister};
use crate::memory::{read_u16_be, write_u16_be};
use crate::{CoreState, FaultCode};

/// Address a load or store targets, `None` when the method carries none.
fn effective_address(state: &CoreState, method: TransferMethod) -> Option<u16> {
    match method {
        TransferMethod::Absolute => Some(state.latch.word()),
        TransferMethod::IndirectMar => Some(state.regs.mar()),
        TransferMethod::Immediate | TransferMethod::Reserved11 => None,
    }
}

/// Loads `register` from memory or from the latched constant.
///
/// The undefined method `3` leaves every register unchanged.
pub fn load(state: &mut CoreState, register: TransferRegister, method: TransferMethod) {
    if method == TransferMethod::Immediate {
        match register {
            TransferRegister::Accumulator => state.regs.set_acc(state.latch.msb),
            TransferRegister::Mar => state.regs.set_mar(state.latch.word()),
        }
        return;
    }

    let Some(addr) = effective_address(state, method) else {
        tracing::debug!(?method, "load with undefined method ignored");
        return;
    };

    match register {
        TransferRegister::Accumulator => state.regs.set_acc(state.memory[usize::from(addr)]),
        TransferRegister::Mar => state.regs.set_mar(read_u16_be(&state.memory, addr)),
    }
}

/// Stores `register` to memory.
///
/// # Errors
///
/// Returns [`FaultCode::UnresolvedAddress`] for the immediate-constant
/// method, which names no memory location.
pub fn store(
    state: &mut CoreState,
    register: TransferRegister,
    method: TransferMethod,
) -> Result<(), FaultCode> {
    if method == TransferMethod::Immediate {
        return Err(FaultCode::UnresolvedAddress);
    }

    let Some(addr) = effective_address(state, method) else {
        tracing::debug!(?method, "store with undefined method ignored");
        return Ok(());
    };

    tracing::trace!(addr, register = register.name(), "store");
    match register {
        TransferRegister::Accumulator => state.memory[usize::from(addr)] = state.regs.acc(),
        TransferRegister::Mar => write_u16_be(&mut state.memory, addr, state.regs.mar()),
    }
    Ok(())
}
