use std::fmt;

use thiserror::Error;

/// Pipeline stage that raised a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Opcode or operand fetch, or image loading.
    Fetch,
    /// Instruction execution.
    Execute,
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Execute => "execute",
        })
    }
}

/// Stable fault taxonomy surfaced to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// A read or write would go past the end of the 64 KiB address space.
    #[error("access past the end of the address space")]
    OutOfBounds = 0x01,
    /// The instruction selects an addressing combination the encoding leaves undefined.
    #[error("undefined addressing combination")]
    UnresolvedAddress = 0x02,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::OutOfBounds),
            0x02 => Some(Self::UnresolvedAddress),
            _ => None,
        }
    }

    /// Returns the stage that raises this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::OutOfBounds => FaultClass::Fetch,
            Self::UnresolvedAddress => FaultClass::Execute,
        }
    }
}
