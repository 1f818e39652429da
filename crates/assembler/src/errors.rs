//! Structured error reporting for the assembler pipeline.
//!
//! Every phase error carries the 1-indexed source line it came from and
//! formats as `line N: message`.

use std::fmt;

use crate::encoder::{EncodeError, EncodeErrorKind};
use crate::parser::{ParseError, ParseErrorKind};
use crate::symbols::{SymbolError, SymbolErrorKind};

/// A unified assembler error with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    /// The kind of error.
    pub kind: AssembleErrorKind,
    /// 1-indexed source line, when the error belongs to one.
    pub line: Option<usize>,
}

impl AssembleError {
    /// Creates an error not tied to a source line.
    #[must_use]
    pub const fn new(kind: AssembleErrorKind) -> Self {
        Self { kind, line: None }
    }

    /// Creates an error for `line`.
    #[must_use]
    pub const fn at_line(kind: AssembleErrorKind, line: usize) -> Self {
        Self {
            kind,
            line: Some(line),
        }
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<ParseError> for AssembleError {
    fn from(e: ParseError) -> Self {
        Self::at_line(AssembleErrorKind::Parse(e.kind), e.line)
    }
}

impl From<SymbolError> for AssembleError {
    fn from(e: SymbolError) -> Self {
        Self::at_line(AssembleErrorKind::Symbol(e.kind), e.line)
    }
}

impl From<EncodeError> for AssembleError {
    fn from(e: EncodeError) -> Self {
        Self::at_line(AssembleErrorKind::Encode(e.kind), e.line)
    }
}

/// Classification of assembler errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleErrorKind {
    /// Source line parsing failed.
    Parse(ParseErrorKind),
    /// Address assignment failed (label redefined, image overflow, `.org`).
    Symbol(SymbolErrorKind),
    /// Encoding failed (undefined label, value range).
    Encode(EncodeErrorKind),
    /// Reading the source failed.
    Io(String),
}

impl fmt::Display for AssembleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Symbol(e) => write!(f, "{e}"),
            Self::Encode(e) => write!(f, "{e}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AssembleError, AssembleErrorKind};
    use crate::encoder::{EncodeError, EncodeErrorKind};
    use crate::parser::parse_line;

    #[test]
    fn error_without_line() {
        let error = AssembleError::new(AssembleErrorKind::Io("file not found".into()));
        assert_eq!(error.to_string(), "I/O error: file not found");
    }

    #[test]
    fn parse_error_keeps_its_line() {
        let parse_err = parse_line("BOGUS", 10).expect_err("unknown mnemonic");
        let error = AssembleError::from(parse_err);
        assert_eq!(error.line, Some(10));
        assert_eq!(error.to_string(), "line 10: unknown mnemonic: BOGUS");
    }

    #[test]
    fn encode_error_keeps_its_line() {
        let error = AssembleError::from(EncodeError {
            kind: EncodeErrorKind::UndefinedLabel("x".into()),
            line: 3,
        });
        assert_eq!(error.to_string(), "line 3: undefined label: x");
    }
}
