//! Head lookups and staged head writes

use std::sync::Arc;

use uuid::Uuid;

use crate::storage::{Store, StorageResult, UnitOfWork, Write};

use super::record::FileHead;

/// Head access over the shared store.
#[derive(Debug, Clone)]
pub struct HeadIndex {
    store: Arc<Store>,
}

impl HeadIndex {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn get(&self, file_id: Uuid) -> StorageResult<Option<FileHead>> {
        Ok(self.store.read()?.head(file_id).cloned())
    }

    /// The non-deleted file holding `filename`.
    pub fn find_active(&self, filename: &str) -> StorageResult<Option<FileHead>> {
        Ok(self.store.read()?.active_head(filename).cloned())
    }

    /// Every head, oldest upload first.
    pub fn all(&self) -> StorageResult<Vec<FileHead>> {
        let mut heads: Vec<FileHead> = self.store.read()?.heads().cloned().collect();
        heads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(heads)
    }

    pub fn stage_insert(&self, uow: &mut UnitOfWork, head: FileHead) {
        uow.stage(Write::InsertHead(head));
    }

    /// Stage `head` as the successor of the head at `expected_version`.
    pub fn stage_update(&self, uow: &mut UnitOfWork, expected_version: u32, head: FileHead) {
        uow.stage(Write::UpdateHead { expected_version, head });
    }
}
