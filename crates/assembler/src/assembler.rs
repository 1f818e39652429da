//! Top-level assembler pipeline.
//!
//! 1. **Parse**: every source line becomes a [`ParsedLine`] with its
//!    instruction form already selected.
//! 2. **Pass 1**: address assignment and symbol table construction.
//! 3. **Pass 2**: encoding, with gaps left by `.org` zero-filled.
//!
//! The image always starts at address `0x0000`.

use std::fs;
use std::path::Path;

use crate::encoder::encode_line;
use crate::errors::{AssembleError, AssembleErrorKind};
use crate::parser::{parse_line, ParsedLine};
use crate::symbols::{assign_addresses, SymbolTable};

/// Result of assembly: the binary image plus metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Assembled image, loadable at address `0x0000`.
    pub image: Vec<u8>,
    /// Label definitions.
    pub symbols: SymbolTable,
    /// Address-to-source mapping for listings.
    pub listing: Vec<ListingEntry>,
}

/// An entry in the address-to-source listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Address of the first byte.
    pub address: u16,
    /// Bytes emitted for the line.
    pub bytes: Vec<u8>,
    /// Source line text, trimmed.
    pub source: String,
    /// 1-indexed source line.
    pub line: usize,
}

/// Assembles source text into a binary image.
///
/// # Errors
///
/// Returns the first `AssembleError` raised by any phase:
/// - Parsing (unknown mnemonic, unsupported operands, bad literal)
/// - Pass 1 (label redefined, image overflow, backwards `.org`)
/// - Pass 2 (undefined label, value out of range)
pub fn assemble(source: &str) -> Result<Assembly, AssembleError> {
    let source_lines: Vec<&str> = source.lines().collect();
    let parsed = source_lines
        .iter()
        .enumerate()
        .map(|(index, text)| parse_line(text, index + 1).map(|parsed| (index + 1, parsed)))
        .collect::<Result<Vec<(usize, ParsedLine)>, _>>()?;

    let assignment = assign_addresses(&parsed)?;

    let mut image = Vec::new();
    let mut listing = Vec::new();
    for addressed in &assignment.lines {
        let bytes = encode_line(&addressed.parsed, &assignment.symbols, addressed.source_line)?;
        let address = usize::from(addressed.address);
        if address > image.len() {
            image.resize(address, 0);
        }
        if !bytes.is_empty() {
            listing.push(ListingEntry {
                address: addressed.address,
                bytes: bytes.clone(),
                source: source_lines
                    .get(addressed.source_line - 1)
                    .map_or_else(String::new, |text| text.trim().to_string()),
                line: addressed.source_line,
            });
        }
        image.extend_from_slice(&bytes);
    }

    tracing::debug!(
        bytes = image.len(),
        labels = assignment.symbols.len(),
        "assembled"
    );

    Ok(Assembly {
        image,
        symbols: assignment.symbols,
        listing,
    })
}

/// Reads and assembles a source file.
///
/// # Errors
///
/// Returns [`AssembleErrorKind::Io`] when the file cannot be read, or any
/// error from [`assemble`].
pub fn assemble_file(path: &Path) -> Result<Assembly, AssembleError> {
    let source = fs::read_to_string(path).map_err(|e| {
        AssembleError::new(AssembleErrorKind::Io(format!("{}: {e}", path.display())))
    })?;
    assemble(&source)
}
