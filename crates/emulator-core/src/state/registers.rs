/// Sign bit of the accumulator.
pub const ACC_SIGN_BIT: u8 = 0x80;

/// Architectural register file of the accumulator machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    acc: u8,
    mar: u16,
    ir: u8,
    pc: u16,
}

impl RegisterFile {
    /// Reads the 8-bit accumulator.
    #[must_use]
    pub const fn acc(&self) -> u8 {
        self.acc
    }

    /// Writes the 8-bit accumulator.
    pub const fn set_acc(&mut self, value: u8) {
        self.acc = value;
    }

    /// Reads the 16-bit memory address register.
    #[must_use]
    pub const fn mar(&self) -> u16 {
        self.mar
    }

    /// Writes the 16-bit memory address register.
    pub const fn set_mar(&mut self, value: u16) {
        self.mar = value;
    }

    /// Reads the instruction register (last fetched opcode).
    #[must_use]
    pub const fn ir(&self) -> u8 {
        self.ir
    }

    /// Only fetch writes `IR`.
    pub(crate) const fn set_ir(&mut self, value: u8) {
        self.ir = value;
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// Returns `true` when bit 7 of `ACC` is set.
    #[must_use]
    pub const fn acc_is_negative(&self) -> bool {
        (self.acc & ACC_SIGN_BIT) != 0
    }
}

/// Staging registers filled by fetch and consumed by the following execute.
///
/// `msb`/`lsb` hold the last address or constant read after the opcode.
/// `destination` holds the address of an absolute-memory ALU destination so
/// that a trailing source operand does not overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ImmediateLatch {
    /// Most significant (or only) trailing byte.
    pub msb: u8,
    /// Least significant trailing byte.
    pub lsb: u8,
    /// Absolute destination address of the current ALU instruction.
    pub destination: u16,
}

impl ImmediateLatch {
    /// `MSB:LSB` as a big-endian word.
    #[must_use]
    pub const fn word(&self) -> u16 {
        u16::from_be_bytes([self.msb, self.lsb])
    }

    /// Latches a big-endian pair.
    pub const fn set_pair(&mut self, msb: u8, lsb: u8) {
        self.msb = msb;
        self.lsb = lsb;
    }
}
