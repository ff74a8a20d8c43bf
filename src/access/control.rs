//! Grant reads and staged grant writes

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::head::FileHead;
use crate::identity::Caller;
use crate::storage::{Constraint, Store, StorageResult, UnitOfWork, Write};

use super::grant::AccessGrant;
use super::visibility::is_visible;

/// Grants over the shared store.
#[derive(Debug, Clone)]
pub struct AccessControl {
    store: Arc<Store>,
}

impl AccessControl {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn grant(&self, grant_id: Uuid) -> StorageResult<Option<AccessGrant>> {
        Ok(self.store.read()?.grant(grant_id).cloned())
    }

    /// Grants on a file, oldest first.
    pub fn grants_for_file(&self, file_id: Uuid) -> StorageResult<Vec<AccessGrant>> {
        let mut grants: Vec<AccessGrant> =
            self.store.read()?.grants_for_file(file_id).cloned().collect();
        grants.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(grants)
    }

    pub fn has_grant(&self, file_id: Uuid, user_id: Uuid) -> StorageResult<bool> {
        Ok(self.store.read()?.grant_for(file_id, user_id).is_some())
    }

    /// Stage grants for every user in `user_ids` that does not hold one yet.
    ///
    /// Repeated ids and existing grants are skipped. Returns the grant of
    /// each distinct requested user, existing or new, in request order.
    pub fn stage_grants(
        &self,
        uow: &mut UnitOfWork,
        file_id: Uuid,
        user_ids: &[Uuid],
    ) -> StorageResult<Vec<AccessGrant>> {
        let tables = self.store.read()?;
        let mut seen = HashSet::new();
        let mut grants = Vec::new();

        for &user_id in user_ids {
            if !seen.insert(user_id) {
                continue;
            }
            match tables.grant_for(file_id, user_id) {
                Some(existing) => grants.push(existing.clone()),
                None => {
                    let grant = AccessGrant::new(file_id, user_id);
                    uow.stage(Write::InsertGrant(grant.clone()));
                    grants.push(grant);
                }
            }
        }
        Ok(grants)
    }

    /// Stage removal of a grant, returning it.
    pub fn stage_revoke(&self, uow: &mut UnitOfWork, grant_id: Uuid) -> StorageResult<AccessGrant> {
        let grant = self
            .grant(grant_id)?
            .ok_or(Constraint::MissingGrant(grant_id))?;
        uow.stage(Write::DeleteGrant { grant_id });
        Ok(grant)
    }

    /// Heads `caller` may see, oldest upload first.
    pub fn visible_heads(&self, caller: &Caller, include_deleted: bool) -> StorageResult<Vec<FileHead>> {
        let tables = self.store.read()?;
        let mut heads: Vec<FileHead> = tables
            .heads()
            .filter(|head| include_deleted || head.is_active())
            .filter(|head| {
                let granted = tables.grant_for(head.id, caller.user_id).is_some();
                is_visible(head, caller, granted)
            })
            .cloned()
            .collect();
        heads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(heads)
    }
}
