//! Typed instruction decode and re-encode.
//!
//! [`Decoder::decode`] is total: every opcode byte maps to exactly one
//! [`Instruction`]. Undefined field values stay representable
//! ([`TransferMethod::Reserved11`], [`BranchCondition::Reserved111`]) so that
//! fetch can size them and execute can decide what they do.

use crate::encoding::{
    alu_destination, alu_function, alu_source, branch_condition, classify_family,
    transfer_direction, transfer_method, transfer_register, AluFunction, BranchCondition,
    Destination, Direction, InstructionFamily, Source, TransferMethod, TransferRegister, Width,
    ALU_FAMILY_BIT,
};

/// Base opcode used when encoding branches (`0x10 | condition`).
pub const BRANCH_OPCODE_BASE: u8 = 0x10;

/// A decoded opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Instruction {
    /// Arithmetic/logic operation `destination = destination <function> source`.
    Alu {
        /// ALU function.
        function: AluFunction,
        /// Destination operand, also the first input.
        destination: Destination,
        /// Source operand, the second input.
        source: Source,
    },
    /// Load or store between memory and a register.
    Transfer {
        /// Load or store.
        direction: Direction,
        /// Register moved.
        register: TransferRegister,
        /// Address resolution method.
        method: TransferMethod,
    },
    /// Jump to the latched target when the condition holds.
    Branch {
        /// Condition tested against `ACC`.
        condition: BranchCondition,
    },
    /// Opcode outside every family.
    Unclassified,
}

impl Instruction {
    /// Operand width for ALU instructions, `None` for other families.
    #[must_use]
    pub const fn alu_width(self) -> Option<Width> {
        match self {
            Self::Alu {
                destination,
                source,
                ..
            } => Some(Width::for_operands(destination, source)),
            Self::Transfer { .. } | Self::Branch { .. } | Self::Unclassified => None,
        }
    }

    /// Number of bytes fetch consumes after the opcode.
    #[must_use]
    pub const fn trailing_byte_count(self) -> u8 {
        match self {
            Self::Alu {
                destination,
                source,
                ..
            } => {
                let destination_bytes = match destination {
                    Destination::Absolute => 2,
                    Destination::IndirectMar
                    | Destination::Accumulator
                    | Destination::MarRegister => 0,
                };
                let source_bytes = match source {
                    Source::Immediate => {
                        if matches!(destination, Destination::Accumulator) {
                            1
                        } else {
                            2
                        }
                    }
                    Source::Absolute => 2,
                    Source::IndirectMar | Source::Accumulator => 0,
                };
                destination_bytes + source_bytes
            }
            Self::Transfer {
                register, method, ..
            } => match method {
                TransferMethod::Absolute => 2,
                TransferMethod::Immediate => register.width().bytes(),
                TransferMethod::IndirectMar | TransferMethod::Reserved11 => 0,
            },
            Self::Branch { .. } => 2,
            Self::Unclassified => 0,
        }
    }

    /// Total encoded length including the opcode.
    #[must_use]
    pub const fn length(self) -> u8 {
        1 + self.trailing_byte_count()
    }

    /// Re-encodes this instruction as its canonical opcode byte.
    ///
    /// Branches encode as `0x10 | condition`; [`Instruction::Unclassified`]
    /// has no opcode and returns `None`.
    #[must_use]
    pub const fn encode(self) -> Option<u8> {
        match self {
            Self::Alu {
                function,
                destination,
                source,
            } => Some(
                ALU_FAMILY_BIT | (function.bits() << 4) | (destination.bits() << 2) | source.bits(),
            ),
            Self::Transfer {
                direction,
                register,
                method,
            } => {
                let direction_bit = match direction {
                    Direction::Store => 0,
                    Direction::Load => 0x08,
                };
                let register_bit = match register {
                    TransferRegister::Accumulator => 0,
                    TransferRegister::Mar => 0x04,
                };
                Some(direction_bit | register_bit | method.bits())
            }
            Self::Branch { condition } => Some(BRANCH_OPCODE_BASE | condition.bits()),
            Self::Unclassified => None,
        }
    }
}

/// Opcode decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes an opcode byte into its family and fields.
    #[must_use]
    pub const fn decode(code: u8) -> Instruction {
        match classify_family(code) {
            InstructionFamily::ArithmeticLogic => Instruction::Alu {
                function: alu_function(code),
                destination: alu_destination(code),
                source: alu_source(code),
            },
            InstructionFamily::MemoryTransfer => Instruction::Transfer {
                direction: transfer_direction(code),
                register: transfer_register(code),
                method: transfer_method(code),
            },
            InstructionFamily::Branch => Instruction::Branch {
                condition: branch_condition(code),
            },
            InstructionFamily::Unclassified => Instruction::Unclassified,
        }
    }
}

/// Number of bytes fetch consumes after `code`.
#[must_use]
pub const fn trailing_byte_count(code: u8) -> u8 {
    Decoder::decode(code).trailing_byte_count()
}
