//! # Parser Errors

use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Tabular ingestion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Extension is not a delimited-text or spreadsheet format
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// No header row could be found
    #[error("File is empty: no header row")]
    EmptyContent,

    /// The underlying reader rejected the content
    #[error("Failed to read {format} content: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },
}

impl ParseError {
    pub(crate) fn malformed(format: &'static str, message: impl ToString) -> Self {
        Self::Malformed {
            format,
            message: message.to_string(),
        }
    }
}
