//! Mnemonic table for the accumulator machine.

use accum_core::{AluFunction, BranchCondition, Direction};

/// Instruction kind named by a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    /// `LOAD` or `STORE`.
    Transfer(Direction),
    /// One of the eight ALU functions.
    Alu(AluFunction),
    /// One of the seven branch conditions.
    Branch(BranchCondition),
    /// Driver stop marker; emits the halt opcode.
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MnemonicEntry {
    name: &'static str,
    mnemonic: Mnemonic,
}

const MNEMONIC_ENTRIES: &[MnemonicEntry] = &[
    MnemonicEntry {
        name: "LOAD",
        mnemonic: Mnemonic::Transfer(Direction::Load),
    },
    MnemonicEntry {
        name: "STORE",
        mnemonic: Mnemonic::Transfer(Direction::Store),
    },
    MnemonicEntry {
        name: "AND",
        mnemonic: Mnemonic::Alu(AluFunction::And),
    },
    MnemonicEntry {
        name: "OR",
        mnemonic: Mnemonic::Alu(AluFunction::Or),
    },
    MnemonicEntry {
        name: "XOR",
        mnemonic: Mnemonic::Alu(AluFunction::Xor),
    },
    MnemonicEntry {
        name: "ADD",
        mnemonic: Mnemonic::Alu(AluFunction::Add),
    },
    MnemonicEntry {
        name: "SUB",
        mnemonic: Mnemonic::Alu(AluFunction::Sub),
    },
    MnemonicEntry {
        name: "INC",
        mnemonic: Mnemonic::Alu(AluFunction::Inc),
    },
    MnemonicEntry {
        name: "DEC",
        mnemonic: Mnemonic::Alu(AluFunction::Dec),
    },
    MnemonicEntry {
        name: "NOT",
        mnemonic: Mnemonic::Alu(AluFunction::Not),
    },
    MnemonicEntry {
        name: "BRA",
        mnemonic: Mnemonic::Branch(BranchCondition::Always),
    },
    MnemonicEntry {
        name: "BRZ",
        mnemonic: Mnemonic::Branch(BranchCondition::Zero),
    },
    MnemonicEntry {
        name: "BNE",
        mnemonic: Mnemonic::Branch(BranchCondition::NotZero),
    },
    MnemonicEntry {
        name: "BLT",
        mnemonic: Mnemonic::Branch(BranchCondition::LessThan),
    },
    MnemonicEntry {
        name: "BLE",
        mnemonic: Mnemonic::Branch(BranchCondition::LessOrEqual),
    },
    MnemonicEntry {
        name: "BGT",
        mnemonic: Mnemonic::Branch(BranchCondition::GreaterThan),
    },
    MnemonicEntry {
        name: "BGE",
        mnemonic: Mnemonic::Branch(BranchCondition::GreaterOrEqual),
    },
    MnemonicEntry {
        name: "HALT",
        mnemonic: Mnemonic::Halt,
    },
];

/// Resolves a mnemonic name, ignoring ASCII case.
#[must_use]
pub fn resolve_mnemonic(name: &str) -> Option<Mnemonic> {
    MNEMONIC_ENTRIES
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
        .map(|entry| entry.mnemonic)
}

/// Canonical upper-case name of `mnemonic`.
#[must_use]
pub fn mnemonic_name(mnemonic: Mnemonic) -> &'static str {
    MNEMONIC_ENTRIES
        .iter()
        .find(|entry| entry.mnemonic == mnemonic)
        .map_or("?", |entry| entry.name)
}
