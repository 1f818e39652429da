//! Human-readable machine state report.

use std::fmt;

use crate::state::RegisterFile;
use crate::CoreState;

/// Register file plus a set of watched memory cells, captured at one point.
///
/// Renders as
///
/// ```text
/// ACC: 0x03  IR: 0xB7  MAR: 0x0000  PC: 0x06
/// memory[0x1000]: 0x01
/// ```
///
/// `PC` is printed with two digits below `0x100` and four above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateReport {
    /// Registers at capture time.
    pub regs: RegisterFile,
    /// `(address, value)` for each watched cell, in request order.
    pub watch: Vec<(u16, u8)>,
}

impl StateReport {
    /// Captures registers and the cells listed in `watch`.
    #[must_use]
    pub fn capture(state: &CoreState, watch: &[u16]) -> Self {
        Self {
            regs: state.regs,
            watch: watch
                .iter()
                .map(|&addr| (addr, state.memory[usize::from(addr)]))
                .collect(),
        }
    }
}

impl fmt::Display for StateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ACC: 0x{:02X}  IR: 0x{:02X}  MAR: 0x{:04X}  PC: 0x{:02X}",
            self.regs.acc(),
            self.regs.ir(),
            self.regs.mar(),
            self.regs.pc()
        )?;
        for (addr, value) in &self.watch {
            write!(f, "\nmemory[0x{addr:04X}]: 0x{value:02X}")?;
        }
        Ok(())
    }
}
