//! # Version Entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::head::FileHead;

/// Snapshot of a file's head at the moment a version was created.
///
/// Entries are append-only; nothing updates or removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub file_id: Uuid,
    pub version: u32,
    pub filename: String,
    pub owner_id: Uuid,
    pub size: u64,
    pub rows: u64,
    pub private: bool,
    pub deleted: bool,
    /// SHA-256 of the content this version was built from
    pub checksum: String,
    pub inserted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl VersionEntry {
    /// Snapshot `head` as the entry for its current version.
    pub fn snapshot(head: &FileHead, inserted_by: Uuid, checksum: impl Into<String>) -> Self {
        Self {
            file_id: head.id,
            version: head.version,
            filename: head.filename.clone(),
            owner_id: head.owner_id,
            size: head.size,
            rows: head.rows,
            private: head.private,
            deleted: head.deleted,
            checksum: checksum.into(),
            inserted_by,
            created_at: Utc::now(),
        }
    }
}
