//! Pass one: address assignment and the label table.
//!
//! Every instruction and directive has a size fixed by the parser, so one
//! walk over the parsed lines places them all and binds each label.

use std::collections::HashMap;
use std::fmt;

use crate::parser::{Directive, ParsedLine, Statement};

/// Where a label points and where it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Bound address.
    pub address: u16,
    /// Line carrying the `label:` definition.
    pub line: usize,
}

/// Labels by name.
pub type SymbolTable = HashMap<String, Symbol>;

/// Pass-one failure tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolError {
    /// What went wrong.
    pub kind: SymbolErrorKind,
    /// 1-based line of the offending statement.
    pub line: usize,
}

/// Pass-one failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolErrorKind {
    /// A label name was bound twice.
    LabelRedefined {
        /// Label name.
        name: String,
        /// Line of the earlier binding.
        previous_line: usize,
    },
    /// Placed content ends beyond `0xFFFF`.
    ImageOverflow {
        /// One past the last byte that would be placed.
        end: u32,
    },
    /// `.org` target lies below content already placed.
    OrgBackwards {
        /// Next free address.
        current: u16,
        /// Address named by `.org`.
        requested: u16,
    },
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl fmt::Display for SymbolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LabelRedefined {
                name,
                previous_line,
            } => write!(f, "label `{name}` already defined on line {previous_line}"),
            Self::ImageOverflow { end } => {
                write!(f, "program does not fit in 64 KiB (ends at 0x{end:05X})")
            }
            Self::OrgBackwards { current, requested } => write!(
                f,
                ".org 0x{requested:04X} is below the next free address 0x{current:04X}"
            ),
        }
    }
}

impl std::error::Error for SymbolError {}

/// A non-blank line placed at its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressedLine {
    /// First byte of the line's content.
    pub address: u16,
    /// Bytes the line occupies.
    pub size: u16,
    /// Parsed statement and label.
    pub parsed: ParsedLine,
    /// 1-based source line number.
    pub source_line: usize,
}

/// Output of pass one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Placed lines in source order.
    pub lines: Vec<AddressedLine>,
    /// Every label bound in the source.
    pub symbols: SymbolTable,
    /// One past the last byte of content.
    pub end_address: u32,
}

/// Bytes a parsed line occupies. `.org` and bare labels take none.
#[must_use]
pub fn line_size(parsed: &ParsedLine) -> u16 {
    match &parsed.statement {
        None => 0,
        Some(Statement::Instruction(instruction)) => instruction.size(),
        Some(Statement::Directive(directive)) => directive_size(directive),
    }
}

fn directive_size(directive: &Directive) -> u16 {
    let (count, unit) = match directive {
        Directive::Org(_) => (0, 0),
        Directive::Byte(values) => (values.len(), 1),
        Directive::Word(values) => (values.len(), 2),
    };
    u16::try_from(count)
        .unwrap_or(u16::MAX)
        .saturating_mul(unit)
}

/// Places `(source_line, parsed)` pairs and binds their labels.
///
/// Addresses start at `0x0000`. Labels take the address of the content that
/// follows them on the same line, or of the next line's content.
///
/// # Errors
///
/// Stops at the first line that redefines a label, moves `.org` backwards
/// or pushes content past `0xFFFF`.
pub fn assign_addresses(lines: &[(usize, ParsedLine)]) -> Result<Assignment, SymbolError> {
    let mut symbols = SymbolTable::new();
    let mut addressed = Vec::with_capacity(lines.len());
    let mut pc: u32 = 0;

    for (source_line, parsed) in lines {
        let source_line = *source_line;
        if parsed.is_blank() {
            continue;
        }

        let overflow = |end| SymbolError {
            kind: SymbolErrorKind::ImageOverflow { end },
            line: source_line,
        };
        let line_address = u16::try_from(pc).map_err(|_| overflow(pc))?;

        if let Some(Statement::Directive(Directive::Org(requested))) = &parsed.statement {
            if u32::from(*requested) < pc {
                return Err(SymbolError {
                    kind: SymbolErrorKind::OrgBackwards {
                        current: line_address,
                        requested: *requested,
                    },
                    line: source_line,
                });
            }
        }

        let address = match &parsed.statement {
            Some(Statement::Directive(Directive::Org(requested))) => *requested,
            _ => line_address,
        };

        if let Some(name) = &parsed.label {
            if let Some(existing) = symbols.get(name) {
                return Err(SymbolError {
                    kind: SymbolErrorKind::LabelRedefined {
                        name: name.clone(),
                        previous_line: existing.line,
                    },
                    line: source_line,
                });
            }
            symbols.insert(
                name.clone(),
                Symbol {
                    address,
                    line: source_line,
                },
            );
        }

        let size = line_size(parsed);
        addressed.push(AddressedLine {
            address,
            size,
            parsed: parsed.clone(),
            source_line,
        });

        pc = u32::from(address) + u32::from(size);
        if pc > u32::from(u16::MAX) + 1 {
            return Err(overflow(pc));
        }
    }

    Ok(Assignment {
        lines: addressed,
        symbols,
        end_address: pc,
    })
}

#[cfg(test)]
mod tests {
    use super::{assign_addresses, Assignment, SymbolError, SymbolErrorKind};
    use crate::parser::parse_line;

    fn assign(source: &[&str]) -> Result<Assignment, SymbolError> {
        let lines: Vec<_> = source
            .iter()
            .enumerate()
            .map(|(i, s)| (i + 1, parse_line(s, i + 1).expect("line parses")))
            .collect();
        assign_addresses(&lines)
    }

    #[test]
    fn empty_source() {
        let result = assign(&[]).expect("empty source assigns");
        assert!(result.lines.is_empty());
        assert!(result.symbols.is_empty());
        assert_eq!(result.end_address, 0);
    }

    #[test]
    fn labels_take_address_of_following_content() {
        let result = assign(&["start:", "LOAD ACC, [0x1000]", "loop: DEC ACC", "BNE loop", "end:"])
            .expect("source assigns");
        assert_eq!(result.symbols["start"].address, 0x0000);
        assert_eq!(result.symbols["start"].line, 1);
        assert_eq!(result.symbols["loop"].address, 0x0003);
        assert_eq!(result.symbols["end"].address, 0x0007);
        assert_eq!(result.end_address, 0x0007);
    }

    #[test]
    fn blank_lines_are_dropped() {
        let result = assign(&["; header", "", "INC ACC"]).expect("source assigns");
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].source_line, 3);
    }

    #[test]
    fn org_moves_forward_and_labels_follow() {
        let result = assign(&["HALT", "data: .org 0x1000", ".byte 1, 2, 3", "tail: .word 7"])
            .expect("source assigns");
        assert_eq!(result.symbols["data"].address, 0x1000);
        assert_eq!(result.symbols["tail"].address, 0x1003);
        assert_eq!(result.end_address, 0x1005);
    }

    #[test]
    fn org_backwards_is_rejected() {
        let err = assign(&[".org 0x10", "HALT", ".org 0x08"]).expect_err("org goes backwards");
        assert_eq!(err.line, 3);
        assert_eq!(
            err.kind,
            SymbolErrorKind::OrgBackwards {
                current: 0x11,
                requested: 0x08
            }
        );
    }

    #[test]
    fn duplicate_label_reports_both_lines() {
        let err = assign(&["x: INC ACC", "HALT", "x: HALT"]).expect_err("duplicate label");
        assert_eq!(err.line, 3);
        assert_eq!(
            err.to_string(),
            "label `x` already defined on line 1"
        );
    }

    #[test]
    fn content_may_end_exactly_at_top_of_memory() {
        let result = assign(&[".org 0xFFFF", "HALT"]).expect("last byte fits");
        assert_eq!(result.end_address, 0x10000);

        let err = assign(&[".org 0xFFFF", ".word 1"]).expect_err("word overflows");
        assert!(matches!(err.kind, SymbolErrorKind::ImageOverflow { end: 0x10001 }));
    }
}
