//! Read models returned by the file service

use serde::Serialize;
use uuid::Uuid;

use crate::access::AccessGrant;
use crate::head::FileHead;
use crate::ledger::VersionEntry;
use crate::rows::RowRecord;

/// A file as listed, with the uploader's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileListing {
    #[serde(flatten)]
    pub head: FileHead,
    pub size_kb: f64,
    pub uploader: Option<String>,
}

impl FileListing {
    pub fn new(head: FileHead, uploader: Option<String>) -> Self {
        Self {
            size_kb: head.size_kb(),
            head,
            uploader,
        }
    }
}

/// One ledger entry with the display name of whoever created it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub entry: VersionEntry,
    pub uploader: Option<String>,
}

/// A grant with the grantee's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantView {
    #[serde(flatten)]
    pub grant: AccessGrant,
    pub user_name: Option<String>,
}

/// Rows of one version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataView {
    pub file_id: Uuid,
    pub filename: String,
    pub version: u32,
    pub rows: Vec<RowRecord>,
}

impl DataView {
    /// Column names taken from the first row, in source order.
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.cells.iter().map(|c| c.column.as_str()).collect())
            .unwrap_or_default()
    }
}
