//! Assembly source line parser for instructions, labels, and directives.
//!
//! Parsing also selects the instruction form: each operand combination maps
//! to exactly one opcode and a fixed list of trailing fields, so pass 1 knows
//! every size before any label is resolved.

use accum_core::{
    AluFunction, Destination, Direction, Instruction, Source, TransferMethod, TransferRegister, Width,
    DEFAULT_HALT_OPCODE,
};

use crate::mnemonic::{mnemonic_name, resolve_mnemonic, Mnemonic};

/// Names that cannot be used as labels.
const RESERVED_NAMES: &[&str] = &["ACC", "MAR"];

/// A numeric literal or a label reference resolved in pass 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Literal value as written.
    Number(i64),
    /// Label name.
    Label(String),
}

/// Parsed operand forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `ACC`.
    Accumulator,
    /// `MAR` as a register.
    Mar,
    /// `[MAR]`, memory addressed by `MAR`.
    IndirectMar,
    /// `[value]`, memory at a fixed address.
    Absolute(Value),
    /// `#value`, a constant.
    Immediate(Value),
    /// Bare value, used for branch targets.
    Direct(Value),
}

/// A trailing field emitted after the opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// One byte.
    Byte(Value),
    /// Two bytes, big-endian.
    Word(Value),
}

impl Field {
    /// Encoded size in bytes.
    #[must_use]
    pub const fn size(&self) -> u16 {
        match self {
            Self::Byte(_) => 1,
            Self::Word(_) => 2,
        }
    }
}

/// A parsed instruction with its selected opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// Mnemonic as resolved.
    pub mnemonic: Mnemonic,
    /// Opcode byte.
    pub opcode: u8,
    /// Trailing fields in fetch order.
    pub fields: Vec<Field>,
}

impl ParsedInstruction {
    /// Encoded size in bytes, opcode included.
    #[must_use]
    pub fn size(&self) -> u16 {
        1 + self.fields.iter().map(Field::size).sum::<u16>()
    }
}

/// A parsed data directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `.org addr` - move the output position forward.
    Org(u16),
    /// `.byte v[, v...]` - emit 8-bit values.
    Byte(Vec<Value>),
    /// `.word v[, v...]` - emit 16-bit values, big-endian.
    Word(Vec<Value>),
}

/// Directive or instruction content of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Data directive.
    Directive(Directive),
    /// Instruction.
    Instruction(ParsedInstruction),
}

/// A single parsed source line: an optional label and an optional statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    /// Label defined at the start of the line.
    pub label: Option<String>,
    /// Directive or instruction following the label.
    pub statement: Option<Statement>,
}

impl ParsedLine {
    /// True for empty and comment-only lines.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.label.is_none() && self.statement.is_none()
    }
}

/// Parse error with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-indexed source line.
    pub line: usize,
    /// Kind of parse error.
    pub kind: ParseErrorKind,
}

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unknown mnemonic.
    UnknownMnemonic(String),
    /// Unknown directive name.
    InvalidDirective(String),
    /// Malformed numeric literal.
    InvalidNumber(String),
    /// Value out of range for a directive.
    InvalidDirectiveValue(String),
    /// Label name is malformed or reserved.
    InvalidLabel(String),
    /// Operand text that is not any operand form.
    InvalidOperand(String),
    /// Operands that no encoding of the mnemonic accepts.
    UnsupportedOperands {
        /// Mnemonic name.
        mnemonic: &'static str,
        /// Operand text as written.
        operands: String,
    },
    /// Wrong number of operands.
    OperandCount {
        /// Mnemonic name.
        mnemonic: &'static str,
        /// Operands expected, as text.
        expected: &'static str,
        /// Operands found.
        found: usize,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMnemonic(m) => write!(f, "unknown mnemonic: {m}"),
            Self::InvalidDirective(d) => write!(f, "unknown directive: .{d}"),
            Self::InvalidNumber(v) => write!(f, "invalid number: {v}"),
            Self::InvalidDirectiveValue(v) => write!(f, "invalid directive value: {v}"),
            Self::InvalidLabel(l) => write!(f, "invalid label name: {l}"),
            Self::InvalidOperand(o) => write!(f, "invalid operand: {o}"),
            Self::UnsupportedOperands { mnemonic, operands } => {
                write!(f, "unsupported operands for {mnemonic}: {operands}")
            }
            Self::OperandCount {
                mnemonic,
                expected,
                found,
            } => write!(f, "{mnemonic} takes {expected}, found {found}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Result of parsing a single line.
pub type ParseResult = Result<ParsedLine, ParseError>;

/// Parses a source line into a `ParsedLine`.
///
/// # Errors
///
/// Returns a `ParseError` for unknown mnemonics or directives, malformed
/// numbers or labels, and operand combinations with no encoding.
pub fn parse_line(line: &str, line_number: usize) -> ParseResult {
    let err = |kind| ParseError {
        line: line_number,
        kind,
    };
    let trimmed = strip_comment(line).trim();

    let (label, rest) = match split_label(trimmed) {
        Some((label, rest)) => {
            if !is_valid_label(label) {
                return Err(err(ParseErrorKind::InvalidLabel(label.to_string())));
            }
            (Some(label.to_string()), rest.trim())
        }
        None => (None, trimmed),
    };

    let statement = if rest.is_empty() {
        None
    } else if let Some(directive) = rest.strip_prefix('.') {
        Some(Statement::Directive(parse_directive(directive).map_err(err)?))
    } else {
        Some(Statement::Instruction(parse_instruction(rest).map_err(err)?))
    };

    Ok(ParsedLine { label, statement })
}

fn strip_comment(line: &str) -> &str {
    line.find(';').map_or(line, |pos| &line[..pos])
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let colon_pos = text.find(':')?;
    Some((text[..colon_pos].trim(), &text[colon_pos + 1..]))
}

/// True when `s` is an identifier usable as a label.
#[must_use]
pub fn is_valid_label(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(s))
}

fn split_first_word(text: &str) -> (&str, &str) {
    text.find(char::is_whitespace)
        .map_or((text, ""), |pos| (&text[..pos], text[pos..].trim()))
}

fn split_list(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        text.split(',').map(str::trim).collect()
    }
}

fn parse_directive(text: &str) -> Result<Directive, ParseErrorKind> {
    let (name, args) = split_first_word(text);

    match name.to_ascii_lowercase().as_str() {
        "org" => {
            let value = parse_number(args).ok_or_else(|| ParseErrorKind::InvalidNumber(args.into()))?;
            u16::try_from(value)
                .map(Directive::Org)
                .map_err(|_| ParseErrorKind::InvalidDirectiveValue(args.into()))
        }
        "byte" => parse_value_list(args).map(Directive::Byte),
        "word" => parse_value_list(args).map(Directive::Word),
        _ => Err(ParseErrorKind::InvalidDirective(name.to_string())),
    }
}

fn parse_value_list(args: &str) -> Result<Vec<Value>, ParseErrorKind> {
    let items = split_list(args);
    if items.is_empty() {
        return Err(ParseErrorKind::InvalidDirectiveValue(args.to_string()));
    }
    items.into_iter().map(parse_value).collect()
}

fn parse_instruction(text: &str) -> Result<ParsedInstruction, ParseErrorKind> {
    let (name, operand_text) = split_first_word(text);
    let mnemonic =
        resolve_mnemonic(name).ok_or_else(|| ParseErrorKind::UnknownMnemonic(name.to_string()))?;
    let operands = split_list(operand_text)
        .into_iter()
        .map(parse_operand)
        .collect::<Result<Vec<_>, _>>()?;

    let unsupported = || ParseErrorKind::UnsupportedOperands {
        mnemonic: mnemonic_name(mnemonic),
        operands: operand_text.to_string(),
    };
    let count = |expected| ParseErrorKind::OperandCount {
        mnemonic: mnemonic_name(mnemonic),
        expected,
        found: operands.len(),
    };

    let (instruction, fields) = match (mnemonic, operands.as_slice()) {
        (Mnemonic::Halt, []) => {
            return Ok(ParsedInstruction {
                mnemonic,
                opcode: DEFAULT_HALT_OPCODE,
                fields: Vec::new(),
            });
        }
        (Mnemonic::Halt, _) => return Err(count("no operands")),
        (Mnemonic::Transfer(direction), [register, operand]) => {
            select_transfer(direction, register, operand).ok_or_else(unsupported)?
        }
        (Mnemonic::Transfer(_), _) => return Err(count("2 operands")),
        (Mnemonic::Alu(function), [destination]) if function.is_unary() => {
            select_alu(function, destination, &Operand::IndirectMar).ok_or_else(unsupported)?
        }
        (Mnemonic::Alu(function), [destination, source]) => {
            select_alu(function, destination, source).ok_or_else(unsupported)?
        }
        (Mnemonic::Alu(function), _) => {
            return Err(count(if function.is_unary() {
                "1 or 2 operands"
            } else {
                "2 operands"
            }))
        }
        (Mnemonic::Branch(condition), [Operand::Direct(target)]) => (
            Instruction::Branch { condition },
            vec![Field::Word(target.clone())],
        ),
        (Mnemonic::Branch(_), [_]) => return Err(unsupported()),
        (Mnemonic::Branch(_), _) => return Err(count("1 operand")),
    };

    let opcode = instruction.encode().ok_or_else(unsupported)?;
    Ok(ParsedInstruction {
        mnemonic,
        opcode,
        fields,
    })
}

fn select_transfer(
    direction: Direction,
    register: &Operand,
    operand: &Operand,
) -> Option<(Instruction, Vec<Field>)> {
    let register = match register {
        Operand::Accumulator => TransferRegister::Accumulator,
        Operand::Mar => TransferRegister::Mar,
        _ => return None,
    };
    let (method, fields) = match (direction, operand) {
        (_, Operand::Absolute(addr)) => (TransferMethod::Absolute, vec![Field::Word(addr.clone())]),
        (_, Operand::IndirectMar) => (TransferMethod::IndirectMar, Vec::new()),
        (Direction::Load, Operand::Immediate(value)) => {
            let field = match register.width() {
                Width::Byte => Field::Byte(value.clone()),
                Width::Word => Field::Word(value.clone()),
            };
            (TransferMethod::Immediate, vec![field])
        }
        _ => return None,
    };
    Some((
        Instruction::Transfer {
            direction,
            register,
            method,
        },
        fields,
    ))
}

fn select_alu(
    function: AluFunction,
    destination: &Operand,
    source: &Operand,
) -> Option<(Instruction, Vec<Field>)> {
    let mut fields = Vec::new();
    let destination = match destination {
        Operand::IndirectMar => Destination::IndirectMar,
        Operand::Accumulator => Destination::Accumulator,
        Operand::Mar => Destination::MarRegister,
        Operand::Absolute(addr) => {
            fields.push(Field::Word(addr.clone()));
            Destination::Absolute
        }
        Operand::Immediate(_) | Operand::Direct(_) => return None,
    };
    let source = match source {
        Operand::IndirectMar => Source::IndirectMar,
        Operand::Accumulator => Source::Accumulator,
        Operand::Immediate(value) => {
            fields.push(if destination == Destination::Accumulator {
                Field::Byte(value.clone())
            } else {
                Field::Word(value.clone())
            });
            Source::Immediate
        }
        Operand::Absolute(addr) => {
            fields.push(Field::Word(addr.clone()));
            Source::Absolute
        }
        Operand::Mar | Operand::Direct(_) => return None,
    };
    Some((
        Instruction::Alu {
            function,
            destination,
            source,
        },
        fields,
    ))
}

fn parse_operand(text: &str) -> Result<Operand, ParseErrorKind> {
    if text.eq_ignore_ascii_case("ACC") {
        return Ok(Operand::Accumulator);
    }
    if text.eq_ignore_ascii_case("MAR") {
        return Ok(Operand::Mar);
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let inner = inner.trim();
        if inner.eq_ignore_ascii_case("MAR") {
            return Ok(Operand::IndirectMar);
        }
        return parse_value(inner).map(Operand::Absolute);
    }
    if let Some(value) = text.strip_prefix('#') {
        return parse_value(value.trim()).map(Operand::Immediate);
    }
    if text.starts_with('[') || text.ends_with(']') {
        return Err(ParseErrorKind::InvalidOperand(text.to_string()));
    }
    parse_value(text).map(Operand::Direct)
}

fn parse_value(text: &str) -> Result<Value, ParseErrorKind> {
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        return parse_number(text)
            .map(Value::Number)
            .ok_or_else(|| ParseErrorKind::InvalidNumber(text.to_string()));
    }
    if is_valid_label(text) {
        return Ok(Value::Label(text.to_string()));
    }
    Err(ParseErrorKind::InvalidOperand(text.to_string()))
}

/// Parses a decimal, `0x` hex or `0b` binary literal.
#[must_use]
#[allow(clippy::option_if_let_else)]
pub fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()
    } else {
        text.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use accum_core::{trailing_byte_count, AluFunction, Direction};
    use rstest::rstest;

    use super::{
        parse_line, parse_number, Directive, Field, ParseErrorKind, ParsedInstruction, ParsedLine,
        Statement, Value,
    };
    use crate::mnemonic::Mnemonic;

    fn instruction(text: &str) -> ParsedInstruction {
        match parse_line(text, 1) {
            Ok(ParsedLine {
                statement: Some(Statement::Instruction(instruction)),
                ..
            }) => instruction,
            other => panic!("expected instruction for {text:?}, got {other:?}"),
        }
    }

    fn error(text: &str) -> ParseErrorKind {
        parse_line(text, 7).expect_err("line should not parse").kind
    }

    #[test]
    fn blank_and_comment_lines() {
        assert!(parse_line("", 1).expect("blank").is_blank());
        assert!(parse_line("   ", 1).expect("blank").is_blank());
        assert!(parse_line("; comment", 1).expect("blank").is_blank());
    }

    #[test]
    fn label_alone_and_with_instruction() {
        let label = parse_line("  loop:  ", 1).expect("label parses");
        assert_eq!(label.label.as_deref(), Some("loop"));
        assert!(label.statement.is_none());

        let both = parse_line("start: INC ACC ; bump", 1).expect("line parses");
        assert_eq!(both.label.as_deref(), Some("start"));
        assert!(matches!(both.statement, Some(Statement::Instruction(_))));
    }

    #[rstest]
    #[case("LOAD ACC, [0x1000]", 0x08, 3)]
    #[case("load acc, #7", 0x09, 2)]
    #[case("LOAD ACC, [MAR]", 0x0A, 1)]
    #[case("LOAD MAR, [0x2000]", 0x0C, 3)]
    #[case("LOAD MAR, #0x1234", 0x0D, 3)]
    #[case("STORE ACC, [0x1003]", 0x00, 3)]
    #[case("STORE MAR, [mar]", 0x06, 1)]
    #[case("ADD ACC, [0x1001]", 0xB7, 3)]
    #[case("XOR ACC, #0xFF", 0xA6, 2)]
    #[case("INC ACC", 0xD4, 1)]
    #[case("INC ACC, ACC", 0xD5, 1)]
    #[case("ADD MAR, #16", 0xBA, 3)]
    #[case("OR [MAR], ACC", 0x91, 1)]
    #[case("SUB [0x2000], [0x3000]", 0xCF, 5)]
    #[case("AND [0x2000], #0x00FF", 0x8E, 5)]
    #[case("BRA 0x0050", 0x10, 3)]
    #[case("BGE 80", 0x16, 3)]
    #[case("HALT", 0x19, 1)]
    fn selects_opcode_and_size(#[case] text: &str, #[case] opcode: u8, #[case] size: u16) {
        let parsed = instruction(text);
        assert_eq!(parsed.opcode, opcode);
        assert_eq!(parsed.size(), size);
        if parsed.mnemonic != Mnemonic::Halt {
            assert_eq!(size, 1 + u16::from(trailing_byte_count(opcode)));
        }
    }

    #[test]
    fn immediate_width_follows_destination() {
        assert_eq!(
            instruction("ADD ACC, #1").fields,
            vec![Field::Byte(Value::Number(1))]
        );
        assert_eq!(
            instruction("ADD [MAR], #1").fields,
            vec![Field::Word(Value::Number(1))]
        );
    }

    #[test]
    fn memory_destination_field_precedes_source_field() {
        assert_eq!(
            instruction("ADD [dst], [src]").fields,
            vec![
                Field::Word(Value::Label("dst".into())),
                Field::Word(Value::Label("src".into()))
            ]
        );
    }

    #[test]
    fn mnemonics_and_registers_ignore_case() {
        let parsed = instruction("store Acc, [Mar]");
        assert_eq!(parsed.mnemonic, Mnemonic::Transfer(Direction::Store));
        assert_eq!(parsed.opcode, 0x02);

        assert_eq!(
            instruction("not acc").mnemonic,
            Mnemonic::Alu(AluFunction::Not)
        );
    }

    #[test]
    fn branch_target_may_be_label() {
        assert_eq!(
            instruction("BNE loop").fields,
            vec![Field::Word(Value::Label("loop".into()))]
        );
    }

    #[test]
    fn directives_parse_value_lists() {
        let parsed = parse_line(".byte 1, 0x02, 0b11", 1).expect("directive parses");
        assert_eq!(
            parsed.statement,
            Some(Statement::Directive(Directive::Byte(vec![
                Value::Number(1),
                Value::Number(2),
                Value::Number(3)
            ])))
        );

        let parsed = parse_line("table: .word start, 0x1234", 1).expect("directive parses");
        assert_eq!(parsed.label.as_deref(), Some("table"));
        assert_eq!(
            parsed.statement,
            Some(Statement::Directive(Directive::Word(vec![
                Value::Label("start".into()),
                Value::Number(0x1234)
            ])))
        );

        let parsed = parse_line(".ORG 0x1000", 1).expect("directive parses");
        assert_eq!(
            parsed.statement,
            Some(Statement::Directive(Directive::Org(0x1000)))
        );
    }

    #[test]
    fn errors_carry_line_number() {
        let err = parse_line("FOO ACC", 12).expect_err("unknown mnemonic");
        assert_eq!(err.line, 12);
        assert_eq!(err.to_string(), "unknown mnemonic: FOO");
    }

    #[rstest]
    #[case("STORE ACC, #1")]
    #[case("LOAD [MAR], ACC")]
    #[case("ADD ACC, MAR")]
    #[case("ADD #1, ACC")]
    #[case("BRZ [0x10]")]
    fn rejects_forms_without_encoding(#[case] text: &str) {
        assert!(matches!(
            error(text),
            ParseErrorKind::UnsupportedOperands { .. }
        ));
    }

    #[rstest]
    #[case("HALT ACC")]
    #[case("ADD ACC")]
    #[case("INC ACC, ACC, ACC")]
    #[case("BRA")]
    #[case("LOAD ACC")]
    fn rejects_wrong_operand_count(#[case] text: &str) {
        assert!(matches!(error(text), ParseErrorKind::OperandCount { .. }));
    }

    #[test]
    fn rejects_bad_literals_labels_and_directives() {
        assert_eq!(
            error("LOAD ACC, #0xZZ"),
            ParseErrorKind::InvalidNumber("0xZZ".into())
        );
        assert_eq!(error("acc: INC ACC"), ParseErrorKind::InvalidLabel("acc".into()));
        assert_eq!(error("1abc:"), ParseErrorKind::InvalidLabel("1abc".into()));
        assert_eq!(
            error(".ascii \"x\""),
            ParseErrorKind::InvalidDirective("ascii".into())
        );
        assert_eq!(
            error(".org 0x10000"),
            ParseErrorKind::InvalidDirectiveValue("0x10000".into())
        );
        assert!(matches!(
            error("LOAD ACC, [0x10"),
            ParseErrorKind::InvalidOperand(_)
        ));
    }

    #[test]
    fn numbers_in_three_bases() {
        assert_eq!(parse_number("42"), Some(42));
        assert_eq!(parse_number("0x2A"), Some(42));
        assert_eq!(parse_number("0b101010"), Some(42));
        assert_eq!(parse_number("forty"), None);
    }
}
