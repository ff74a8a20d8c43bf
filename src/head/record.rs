//! # File Head

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current state of a file: latest version pointer plus live stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHead {
    pub id: Uuid,
    pub filename: String,
    pub owner_id: Uuid,
    pub version: u32,
    pub rows: u64,
    /// Content size in bytes
    pub size: u64,
    pub private: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileHead {
    /// A freshly uploaded file at version 1.
    pub fn new(filename: impl Into<String>, owner_id: Uuid, rows: u64, size: u64, private: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            owner_id,
            version: 1,
            rows,
            size,
            private,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Size in KiB, the unit listings display.
    pub fn size_kb(&self) -> f64 {
        self.size as f64 / 1024.0
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}
