//! # Parsed Table
//!
//! The parser's output: a header and a grid of data rows aligned to it.

use crate::rows::Cell;

use super::errors::{ParseError, ParseResult};

/// Ordered columns plus rows aligned to them.
///
/// Every row has exactly `columns.len()` values. Missing trailing cells
/// are filled with the empty string and surplus cells are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// Build a table from a raw grid whose first row is the header.
    ///
    /// Fails with `EmptyContent` when there is no header or every header
    /// cell is blank.
    pub fn from_grid<I>(grid: I) -> ParseResult<Self>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut grid = grid.into_iter();
        let columns = grid.next().ok_or(ParseError::EmptyContent)?;
        if columns.iter().all(|c| c.trim().is_empty()) {
            return Err(ParseError::EmptyContent);
        }

        let width = columns.len();
        let rows = grid
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Header names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, header excluded.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Pair each row with the header, preserving column order.
    pub fn cells(&self) -> impl Iterator<Item = Vec<Cell>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .zip(row.iter())
                .map(|(column, value)| Cell::new(column.clone(), value.clone()))
                .collect()
        })
    }
}
