//! Instruction and directive encoding (pass 2).
//!
//! Resolves label references against the pass-1 symbol table and converts
//! each addressed line into bytes.

use crate::parser::{Directive, Field, ParsedInstruction, ParsedLine, Statement, Value};
use crate::symbols::SymbolTable;

/// Error during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    /// Kind of error.
    pub kind: EncodeErrorKind,
    /// Source line where the error occurred.
    pub line: usize,
}

/// Classification of encoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// Undefined label reference.
    UndefinedLabel(String),
    /// Value does not fit in an 8-bit field.
    ByteOutOfRange(i64),
    /// Value does not fit in a 16-bit field.
    WordOutOfRange(i64),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndefinedLabel(name) => write!(f, "undefined label: {name}"),
            Self::ByteOutOfRange(val) => write!(f, "value out of 8-bit range: {val}"),
            Self::WordOutOfRange(val) => write!(f, "value out of 16-bit range: {val}"),
        }
    }
}

impl std::error::Error for EncodeError {}

fn resolve(value: &Value, symbols: &SymbolTable) -> Result<i64, EncodeErrorKind> {
    match value {
        Value::Number(number) => Ok(*number),
        Value::Label(name) => symbols
            .get(name)
            .map(|symbol| i64::from(symbol.address))
            .ok_or_else(|| EncodeErrorKind::UndefinedLabel(name.clone())),
    }
}

fn encode_field(field: &Field, symbols: &SymbolTable, out: &mut Vec<u8>) -> Result<(), EncodeErrorKind> {
    match field {
        Field::Byte(value) => {
            let resolved = resolve(value, symbols)?;
            let byte = u8::try_from(resolved).map_err(|_| EncodeErrorKind::ByteOutOfRange(resolved))?;
            out.push(byte);
        }
        Field::Word(value) => {
            let resolved = resolve(value, symbols)?;
            let word = u16::try_from(resolved).map_err(|_| EncodeErrorKind::WordOutOfRange(resolved))?;
            out.extend_from_slice(&word.to_be_bytes());
        }
    }
    Ok(())
}

/// Encodes an instruction: the opcode followed by its fields in order.
///
/// # Errors
///
/// Returns `EncodeError` if a label is undefined or a value does not fit
/// its field.
pub fn encode_instruction(
    instruction: &ParsedInstruction,
    symbols: &SymbolTable,
    source_line: usize,
) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::with_capacity(usize::from(instruction.size()));
    bytes.push(instruction.opcode);
    for field in &instruction.fields {
        encode_field(field, symbols, &mut bytes).map_err(|kind| EncodeError {
            kind,
            line: source_line,
        })?;
    }
    Ok(bytes)
}

/// Encodes a data directive. `.org` produces no bytes; gap filling is the
/// pipeline's job.
///
/// # Errors
///
/// Returns `EncodeError` if a label is undefined or a value is out of range.
pub fn encode_directive(
    directive: &Directive,
    symbols: &SymbolTable,
    source_line: usize,
) -> Result<Vec<u8>, EncodeError> {
    let fields: Vec<Field> = match directive {
        Directive::Org(_) => Vec::new(),
        Directive::Byte(values) => values.iter().cloned().map(Field::Byte).collect(),
        Directive::Word(values) => values.iter().cloned().map(Field::Word).collect(),
    };
    let mut bytes = Vec::with_capacity(fields.len() * 2);
    for field in &fields {
        encode_field(field, symbols, &mut bytes).map_err(|kind| EncodeError {
            kind,
            line: source_line,
        })?;
    }
    Ok(bytes)
}

/// Encodes a parsed line to bytes.
///
/// # Errors
///
/// Returns `EncodeError` if encoding fails.
pub fn encode_line(
    parsed: &ParsedLine,
    symbols: &SymbolTable,
    source_line: usize,
) -> Result<Vec<u8>, EncodeError> {
    match &parsed.statement {
        None => Ok(Vec::new()),
        Some(Statement::Directive(directive)) => encode_directive(directive, symbols, source_line),
        Some(Statement::Instruction(instruction)) => {
            encode_instruction(instruction, symbols, source_line)
        }
    }
}
