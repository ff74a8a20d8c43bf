//! # Unit of Work
//!
//! Writes are staged here and reach the tables only through
//! [`Store::commit`](super::Store::commit), all or nothing. A unit of work
//! that is dropped without being committed leaves no trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::AccessGrant;
use crate::head::FileHead;
use crate::ledger::VersionEntry;
use crate::rows::RowRecord;

/// One staged table write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Write {
    /// New head; its filename must be free among active heads.
    InsertHead(FileHead),

    /// Replace a head that must still be at `expected_version`.
    UpdateHead { expected_version: u32, head: FileHead },

    /// Next ledger entry of a file.
    AppendVersion(VersionEntry),

    /// The full row set of one version.
    InsertRows {
        file_id: Uuid,
        version: u32,
        rows: Vec<RowRecord>,
    },

    InsertGrant(AccessGrant),

    DeleteGrant { grant_id: Uuid },
}

/// Staged writes of one logical operation.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, write: Write) {
        self.writes.push(write);
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub(crate) fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// A committed unit of work as recorded in the commit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitBatch {
    /// Commit sequence number, starting at 1, never reused
    pub sequence: u64,
    pub committed_at: DateTime<Utc>,
    pub writes: Vec<Write>,
}

impl CommitBatch {
    pub fn new(sequence: u64, writes: Vec<Write>) -> Self {
        Self {
            sequence,
            committed_at: Utc::now(),
            writes,
        }
    }
}
