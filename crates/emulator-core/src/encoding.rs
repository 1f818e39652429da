//! Opcode classification and field extraction.
//!
//! One opcode byte carries three overlapping instruction families. They are
//! tested in priority order:
//!
//! | Family          | Predicate            | Fields                                  |
//! |-----------------|----------------------|-----------------------------------------|
//! | Arithmetic/logic| `code & 0x80 != 0`   | func `6..4`, dest `3..2`, source `1..0` |
//! | Memory transfer | `code & 0xF0 == 0`   | direction `3`, register `2`, method `1..0` |
//! | Branch          | `code & 0xF8 != 0`   | condition `2..0`                        |
//!
//! Anything else is unclassified and has no effect.

/// Selector bit for the arithmetic/logic family.
pub const ALU_FAMILY_BIT: u8 = 0x80;
/// Mask of bits that must be clear for the memory transfer family.
pub const TRANSFER_FAMILY_MASK: u8 = 0xF0;
/// Mask of bits of which at least one must be set for the branch family.
pub const BRANCH_FAMILY_MASK: u8 = 0xF8;

const ALU_FUNCTION_MASK: u8 = 0x70;
const ALU_DESTINATION_MASK: u8 = 0x0C;
const ALU_SOURCE_MASK: u8 = 0x03;
const TRANSFER_DIRECTION_BIT: u8 = 0x08;
const TRANSFER_REGISTER_BIT: u8 = 0x04;
const TRANSFER_METHOD_MASK: u8 = 0x03;
const BRANCH_CONDITION_MASK: u8 = 0x07;

/// Instruction family selected by an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionFamily {
    /// Eight ALU functions over register and memory operands.
    ArithmeticLogic,
    /// Loads and stores between memory and `ACC`/`MAR`.
    MemoryTransfer,
    /// Conditional and unconditional jumps.
    Branch,
    /// No operand fetch and no execution effect.
    Unclassified,
}

/// Returns true when `code` belongs to the arithmetic/logic family.
#[must_use]
pub const fn is_arithmetic_logic(code: u8) -> bool {
    (code & ALU_FAMILY_BIT) != 0
}

/// Returns true when `code` belongs to the memory transfer family.
#[must_use]
pub const fn is_memory_transfer(code: u8) -> bool {
    (code & TRANSFER_FAMILY_MASK) == 0
}

/// Returns true when `code` satisfies the raw branch predicate.
///
/// The predicate overlaps the arithmetic/logic family; callers must test the
/// families in priority order, as [`classify_family`] does.
#[must_use]
pub const fn is_branch(code: u8) -> bool {
    (code & BRANCH_FAMILY_MASK) != 0
}

/// Classifies an opcode into exactly one instruction family.
#[must_use]
pub const fn classify_family(code: u8) -> InstructionFamily {
    if is_arithmetic_logic(code) {
        InstructionFamily::ArithmeticLogic
    } else if is_memory_transfer(code) {
        InstructionFamily::MemoryTransfer
    } else if is_branch(code) {
        InstructionFamily::Branch
    } else {
        InstructionFamily::Unclassified
    }
}

/// ALU function selected by bits 6..4 of an arithmetic/logic opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum AluFunction {
    And = 0,
    Or = 1,
    Xor = 2,
    Add = 3,
    Sub = 4,
    Inc = 5,
    Dec = 6,
    Not = 7,
}

impl AluFunction {
    /// All functions in encoding order.
    pub const ALL: [Self; 8] = [
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Add,
        Self::Sub,
        Self::Inc,
        Self::Dec,
        Self::Not,
    ];

    /// Decodes a 3-bit function field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::And),
            1 => Some(Self::Or),
            2 => Some(Self::Xor),
            3 => Some(Self::Add),
            4 => Some(Self::Sub),
            5 => Some(Self::Inc),
            6 => Some(Self::Dec),
            7 => Some(Self::Not),
            _ => None,
        }
    }

    /// Returns the raw field value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// `INC`, `DEC` and `NOT` ignore the source operand.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Inc | Self::Dec | Self::Not)
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Inc => "INC",
            Self::Dec => "DEC",
            Self::Not => "NOT",
        }
    }
}

/// ALU destination addressing (bits 3..2).
///
/// Kept separate from [`Source`]: code `2` means the `MAR` register here but
/// an immediate constant on the source side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Destination {
    /// Memory at the address held in `MAR`.
    IndirectMar = 0,
    /// The accumulator.
    Accumulator = 1,
    /// The `MAR` register itself.
    MarRegister = 2,
    /// Memory at an address carried in the instruction.
    Absolute = 3,
}

impl Destination {
    /// Decodes a 2-bit destination field.
    #[must_use]
    pub const fn from_u2(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::IndirectMar),
            1 => Some(Self::Accumulator),
            2 => Some(Self::MarRegister),
            3 => Some(Self::Absolute),
            _ => None,
        }
    }

    /// Returns the raw field value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// ALU source addressing (bits 1..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Source {
    /// Memory at the address held in `MAR`.
    IndirectMar = 0,
    /// The accumulator.
    Accumulator = 1,
    /// Constant carried in the instruction.
    Immediate = 2,
    /// Memory at an address carried in the instruction.
    Absolute = 3,
}

impl Source {
    /// Decodes a 2-bit source field.
    #[must_use]
    pub const fn from_u2(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::IndirectMar),
            1 => Some(Self::Accumulator),
            2 => Some(Self::Immediate),
            3 => Some(Self::Absolute),
            _ => None,
        }
    }

    /// Returns the raw field value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Operand width of an ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Width {
    /// 8-bit operands, results wrap modulo 256.
    Byte,
    /// 16-bit operands, results wrap modulo 65536.
    Word,
}

impl Width {
    /// Byte width whenever the accumulator takes part, word width otherwise.
    #[must_use]
    pub const fn for_operands(destination: Destination, source: Source) -> Self {
        if matches!(destination, Destination::Accumulator)
            || matches!(source, Source::Accumulator)
        {
            Self::Byte
        } else {
            Self::Word
        }
    }

    /// Mask selecting the bits that survive an operation of this width.
    #[must_use]
    pub const fn mask(self) -> u16 {
        match self {
            Self::Byte => 0x00FF,
            Self::Word => 0xFFFF,
        }
    }

    /// Number of bytes an operand of this width occupies in memory.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
        }
    }
}

/// Memory transfer direction (bit 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Direction {
    Store,
    Load,
}

/// Register moved by a memory transfer (bit 2).
///
/// A clear bit selects the 8-bit accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TransferRegister {
    /// `ACC`, one byte.
    Accumulator,
    /// `MAR`, two bytes big-endian.
    Mar,
}

impl TransferRegister {
    /// Width of the data moved for this register.
    #[must_use]
    pub const fn width(self) -> Width {
        match self {
            Self::Accumulator => Width::Byte,
            Self::Mar => Width::Word,
        }
    }

    /// Assembly register name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Accumulator => "ACC",
            Self::Mar => "MAR",
        }
    }
}

/// Memory transfer addressing method (bits 1..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TransferMethod {
    /// Address carried in the instruction.
    Absolute,
    /// Constant carried in the instruction (load only).
    Immediate,
    /// Address held in `MAR`.
    IndirectMar,
    /// Method `3`, which the encoding leaves undefined.
    Reserved11,
}

impl TransferMethod {
    /// Decodes a 2-bit method field.
    #[must_use]
    pub const fn from_u2(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Absolute),
            1 => Some(Self::Immediate),
            2 => Some(Self::IndirectMar),
            3 => Some(Self::Reserved11),
            _ => None,
        }
    }

    /// Returns the raw field value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Absolute => 0,
            Self::Immediate => 1,
            Self::IndirectMar => 2,
            Self::Reserved11 => 3,
        }
    }
}

/// Branch condition (bits 2..0), evaluated against `ACC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BranchCondition {
    /// Always taken.
    Always,
    /// `ACC == 0`.
    Zero,
    /// `ACC != 0`.
    NotZero,
    /// Sign bit set.
    LessThan,
    /// Sign bit set or zero.
    LessOrEqual,
    /// Sign bit clear and nonzero.
    GreaterThan,
    /// Sign bit clear.
    GreaterOrEqual,
    /// Condition `7`, which the encoding leaves undefined.
    Reserved111,
}

impl BranchCondition {
    /// The seven defined conditions in encoding order.
    pub const DEFINED: [Self; 7] = [
        Self::Always,
        Self::Zero,
        Self::NotZero,
        Self::LessThan,
        Self::LessOrEqual,
        Self::GreaterThan,
        Self::GreaterOrEqual,
    ];

    /// Decodes a 3-bit condition field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Always),
            1 => Some(Self::Zero),
            2 => Some(Self::NotZero),
            3 => Some(Self::LessThan),
            4 => Some(Self::LessOrEqual),
            5 => Some(Self::GreaterThan),
            6 => Some(Self::GreaterOrEqual),
            7 => Some(Self::Reserved111),
            _ => None,
        }
    }

    /// Returns the raw field value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Always => 0,
            Self::Zero => 1,
            Self::NotZero => 2,
            Self::LessThan => 3,
            Self::LessOrEqual => 4,
            Self::GreaterThan => 5,
            Self::GreaterOrEqual => 6,
            Self::Reserved111 => 7,
        }
    }

    /// Assembly mnemonic, `None` for the undefined condition.
    #[must_use]
    pub const fn mnemonic(self) -> Option<&'static str> {
        match self {
            Self::Always => Some("BRA"),
            Self::Zero => Some("BRZ"),
            Self::NotZero => Some("BNE"),
            Self::LessThan => Some("BLT"),
            Self::LessOrEqual => Some("BLE"),
            Self::GreaterThan => Some("BGT"),
            Self::GreaterOrEqual => Some("BGE"),
            Self::Reserved111 => None,
        }
    }
}

/// Extracts the ALU function field.
#[must_use]
pub const fn alu_function(code: u8) -> AluFunction {
    match AluFunction::from_u3((code & ALU_FUNCTION_MASK) >> 4) {
        Some(function) => function,
        None => AluFunction::And,
    }
}

/// Extracts the ALU destination field.
#[must_use]
pub const fn alu_destination(code: u8) -> Destination {
    match Destination::from_u2((code & ALU_DESTINATION_MASK) >> 2) {
        Some(destination) => destination,
        None => Destination::IndirectMar,
    }
}

/// Extracts the ALU source field.
#[must_use]
pub const fn alu_source(code: u8) -> Source {
    match Source::from_u2(code & ALU_SOURCE_MASK) {
        Some(source) => source,
        None => Source::IndirectMar,
    }
}

/// Extracts the memory transfer direction.
#[must_use]
pub const fn transfer_direction(code: u8) -> Direction {
    if (code & TRANSFER_DIRECTION_BIT) == 0 {
        Direction::Store
    } else {
        Direction::Load
    }
}

/// Extracts the memory transfer register.
#[must_use]
pub const fn transfer_register(code: u8) -> TransferRegister {
    if (code & TRANSFER_REGISTER_BIT) == 0 {
        TransferRegister::Accumulator
    } else {
        TransferRegister::Mar
    }
}

/// Extracts the memory transfer method.
#[must_use]
pub const fn transfer_method(code: u8) -> TransferMethod {
    match TransferMethod::from_u2(code & TRANSFER_METHOD_MASK) {
        Some(method) => method,
        None => TransferMethod::Absolute,
    }
}

/// Extracts the branch condition.
#[must_use]
pub const fn branch_condition(code: u8) -> BranchCondition {
    match BranchCondition::from_u3(code & BRANCH_CONDITION_MASK) {
        Some(condition) => condition,
        None => BranchCondition::Always,
    }
}
