//! Ledger reads and staged appends

use std::sync::Arc;

use uuid::Uuid;

use crate::head::FileHead;
use crate::storage::{Store, StorageResult, UnitOfWork, Write};

use super::entry::VersionEntry;

/// Version history over the shared store.
#[derive(Debug, Clone)]
pub struct VersionLedger {
    store: Arc<Store>,
}

impl VersionLedger {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn entry(&self, file_id: Uuid, version: u32) -> StorageResult<Option<VersionEntry>> {
        Ok(self.store.read()?.version(file_id, version).cloned())
    }

    /// Every version of a file, newest first.
    pub fn history(&self, file_id: Uuid) -> StorageResult<Vec<VersionEntry>> {
        Ok(self.store.read()?.versions(file_id).rev().cloned().collect())
    }

    /// Stage the entry for `head`'s current version.
    pub fn stage_append(
        &self,
        uow: &mut UnitOfWork,
        head: &FileHead,
        actor: Uuid,
        checksum: impl Into<String>,
    ) -> VersionEntry {
        let entry = VersionEntry::snapshot(head, actor, checksum);
        uow.stage(Write::AppendVersion(entry.clone()));
        entry
    }
}
