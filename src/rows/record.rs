//! # Row Records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One column/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub column: String,
    pub value: String,
}

impl Cell {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A single data row of one file version.
///
/// `cells` keeps the source column order. `index` is the row's position
/// within its version and is the read order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRecord {
    pub file_id: Uuid,
    pub version: u32,
    pub index: u64,
    pub cells: Vec<Cell>,
    pub inserted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RowRecord {
    pub fn new(
        file_id: Uuid,
        version: u32,
        index: u64,
        cells: Vec<Cell>,
        inserted_by: Uuid,
    ) -> Self {
        Self {
            file_id,
            version,
            index,
            cells,
            inserted_by,
            created_at: Utc::now(),
        }
    }

    /// Content-identical copy tagged with another version.
    pub fn copy_to(&self, version: u32, inserted_by: Uuid) -> Self {
        Self::new(self.file_id, version, self.index, self.cells.clone(), inserted_by)
    }

    /// Value of the first cell with the given column name.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.value.as_str())
    }

    /// Values in column order.
    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.value.as_str()).collect()
    }
}
