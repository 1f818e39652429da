//! Instruction disassembly.
//!
//! Output uses the assembler's syntax, so a listing of any image assembles
//! back to the same bytes. Opcodes without a mnemonic (non-canonical branch
//! encodings, undefined transfer methods and branch conditions, stores of a
//! constant) are listed as `.byte` rows covering their full fetch length.

use std::fmt::Write as _;

use crate::api::CoreConfig;
use crate::decoder::{Decoder, Instruction};
use crate::encoding::{AluFunction, Destination, Direction, Source, TransferMethod, Width};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DisassemblyRow {
    /// Address of the first byte.
    pub addr_start: u16,
    /// Number of bytes covered, opcode included.
    pub len_bytes: u8,
    /// Raw bytes covered.
    pub bytes: Vec<u8>,
    /// Mnemonic (`"ADD"`, `"HALT"`) or `".byte"` for data rows.
    pub mnemonic: String,
    /// Formatted operands, empty when there are none.
    pub operands: String,
    /// True when the row is raw data rather than a decodable instruction.
    pub is_data: bool,
}

impl DisassemblyRow {
    /// Renders the row as one line of assembly source.
    #[must_use]
    pub fn to_source(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }
}

/// Disassembles the instruction at `addr` in a full memory image.
///
/// Returns `None` when the instruction would run past the end of `memory`.
#[must_use]
pub fn disassemble_one(addr: u16, memory: &[u8], config: &CoreConfig) -> Option<DisassemblyRow> {
    let bytes = memory.get(usize::from(addr)..)?;
    let (opcode, _) = bytes.split_first()?;
    let len = instruction_length(*opcode, config);
    bytes
        .get(..usize::from(len))
        .map(|raw| render(addr, raw, config))
}

/// Disassembles `image` as if loaded at `origin`.
///
/// A final instruction cut short by the end of the image becomes a `.byte`
/// row over the bytes that remain.
#[must_use]
pub fn disassemble_range(origin: u16, image: &[u8], config: &CoreConfig) -> Vec<DisassemblyRow> {
    let mut rows = Vec::new();
    let mut offset = 0_usize;
    let mut addr = origin;

    while let Some(&opcode) = image.get(offset) {
        let len = usize::from(instruction_length(opcode, config));
        let end = (offset + len).min(image.len());
        let raw = &image[offset..end];
        let row = if raw.len() == len {
            render(addr, raw, config)
        } else {
            data_row(addr, raw)
        };
        offset = end;
        addr = addr.wrapping_add(u16::from(row.len_bytes));
        rows.push(row);
    }

    rows
}

fn instruction_length(opcode: u8, config: &CoreConfig) -> u8 {
    if opcode == config.halt_opcode {
        1
    } else {
        Decoder::decode(opcode).length()
    }
}

fn render(addr: u16, raw: &[u8], config: &CoreConfig) -> DisassemblyRow {
    let Some((&opcode, operands)) = raw.split_first() else {
        return data_row(addr, raw);
    };
    if opcode == config.halt_opcode {
        return instruction_row(addr, raw, "HALT", String::new());
    }

    let instruction = Decoder::decode(opcode);
    if instruction.encode() != Some(opcode) {
        return data_row(addr, raw);
    }

    match instruction {
        Instruction::Alu {
            function,
            destination,
            source,
        } => {
            let text = alu_operands(function, destination, source, operands);
            instruction_row(addr, raw, function.mnemonic(), text)
        }
        Instruction::Transfer {
            direction,
            register,
            method,
        } => {
            let operand = match (direction, method) {
                (_, TransferMethod::Absolute) => format!("[{}]", hex_word(operands)),
                (_, TransferMethod::IndirectMar) => "[MAR]".to_string(),
                (Direction::Load, TransferMethod::Immediate) => match register.width() {
                    Width::Byte => format!("#0x{:02X}", operands[0]),
                    Width::Word => format!("#{}", hex_word(operands)),
                },
                (Direction::Store, TransferMethod::Immediate) | (_, TransferMethod::Reserved11) => {
                    return data_row(addr, raw);
                }
            };
            let mnemonic = match direction {
                Direction::Load => "LOAD",
                Direction::Store => "STORE",
            };
            instruction_row(addr, raw, mnemonic, format!("{}, {operand}", register.name()))
        }
        Instruction::Branch { condition } => match condition.mnemonic() {
            Some(mnemonic) => instruction_row(addr, raw, mnemonic, hex_word(operands)),
            None => data_row(addr, raw),
        },
        Instruction::Unclassified => data_row(addr, raw),
    }
}

fn alu_operands(
    function: AluFunction,
    destination: Destination,
    source: Source,
    operands: &[u8],
) -> String {
    let (destination_text, rest) = match destination {
        Destination::IndirectMar => ("[MAR]".to_string(), operands),
        Destination::Accumulator => ("ACC".to_string(), operands),
        Destination::MarRegister => ("MAR".to_string(), operands),
        Destination::Absolute => (format!("[{}]", hex_word(operands)), &operands[2..]),
    };

    if function.is_unary() && source == Source::IndirectMar {
        return destination_text;
    }

    let source_text = match source {
        Source::IndirectMar => "[MAR]".to_string(),
        Source::Accumulator => "ACC".to_string(),
        Source::Immediate if destination == Destination::Accumulator => {
            format!("#0x{:02X}", rest[0])
        }
        Source::Immediate => format!("#{}", hex_word(rest)),
        Source::Absolute => format!("[{}]", hex_word(rest)),
    };
    format!("{destination_text}, {source_text}")
}

fn hex_word(bytes: &[u8]) -> String {
    format!("0x{:02X}{:02X}", bytes[0], bytes[1])
}

fn instruction_row(addr: u16, raw: &[u8], mnemonic: &str, operands: String) -> DisassemblyRow {
    DisassemblyRow {
        addr_start: addr,
        len_bytes: row_length(raw),
        bytes: raw.to_vec(),
        mnemonic: mnemonic.to_string(),
        operands,
        is_data: false,
    }
}

fn data_row(addr: u16, raw: &[u8]) -> DisassemblyRow {
    let mut operands = String::new();
    for (index, byte) in raw.iter().enumerate() {
        if index > 0 {
            operands.push_str(", ");
        }
        let _ = write!(operands, "0x{byte:02X}");
    }
    DisassemblyRow {
        addr_start: addr,
        len_bytes: row_length(raw),
        bytes: raw.to_vec(),
        mnemonic: ".byte".to_string(),
        operands,
        is_data: true,
    }
}

fn row_length(raw: &[u8]) -> u8 {
    // Rows never exceed the five bytes of the longest instruction.
    u8::try_from(raw.len()).unwrap_or(u8::MAX)
}
