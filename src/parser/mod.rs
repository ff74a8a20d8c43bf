//! # Tabular Parser
//!
//! Converts uploaded bytes into an ordered column list and aligned data
//! rows. Two families are recognised: delimited text and spreadsheet
//! cell grids. Parsing is pure and holds no locks, so callers may run it
//! on any thread.

pub mod delimited;
pub mod errors;
pub mod spreadsheet;
pub mod table;

pub use errors::{ParseError, ParseResult};
pub use table::ParsedTable;

use std::path::Path;

/// Source format, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    /// Separator-delimited text with a known separator
    Delimited(u8),
    /// Delimited text with the separator sniffed from the header line
    SniffedText,
    /// Workbook; first worksheet is read
    Spreadsheet,
}

impl TabularFormat {
    /// Map an extension (with or without leading dot, any case) to a format.
    pub fn from_extension(extension: &str) -> ParseResult<Self> {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "csv" => Ok(Self::Delimited(b',')),
            "tsv" | "tab" => Ok(Self::Delimited(b'\t')),
            "txt" => Ok(Self::SniffedText),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(ParseError::UnsupportedFormat(extension.to_string())),
        }
    }

    /// Format for a file name, using its extension.
    pub fn from_file_name(name: &str) -> ParseResult<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ParseError::UnsupportedFormat(name.to_string()))?;
        Self::from_extension(extension)
    }
}

/// Parse content according to its declared extension.
pub fn parse(content: &[u8], extension: &str) -> ParseResult<ParsedTable> {
    let format = TabularFormat::from_extension(extension)?;
    parse_as(content, format)
}

/// Parse content in an already-resolved format.
pub fn parse_as(content: &[u8], format: TabularFormat) -> ParseResult<ParsedTable> {
    let table = match format {
        TabularFormat::Delimited(delimiter) => delimited::parse_delimited(content, delimiter)?,
        TabularFormat::SniffedText => {
            delimited::parse_delimited(content, delimited::sniff_delimiter(content))?
        }
        TabularFormat::Spreadsheet => spreadsheet::parse_spreadsheet(content)?,
    };

    tracing::debug!(
        columns = table.columns().len(),
        rows = table.row_count(),
        bytes = content.len(),
        "parsed tabular content"
    );

    Ok(table)
}
