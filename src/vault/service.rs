//! # File Vault
//!
//! Orchestrates parser, head index, ledger, row store and access control
//! into the file operations. Every mutation is staged into one unit of
//! work and committed as a whole; mutations of an existing file hold its
//! file lock from the first head read until commit.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use serde_json::json;
use uuid::Uuid;

use crate::access::{is_visible, AccessControl, AccessGrant};
use crate::head::{FileHead, HeadIndex, Transition};
use crate::identity::{Caller, IdentityProvider};
use crate::ledger::VersionLedger;
use crate::observability::{AuditEvent, AuditSink};
use crate::parser::{self, ParsedTable, TabularFormat};
use crate::rows::RowStore;
use crate::storage::{content_digest, points, Store};

use super::errors::{VaultError, VaultResult};
use super::requests::{ListOptions, ReplaceRequest, RevertRequest, UploadFile, UploadRequest};
use super::views::{DataView, FileListing, GrantView, HistoryEntry};

/// Default per-file upload limit: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Service limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultOptions {
    pub max_upload_bytes: u64,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// The file service. `Send + Sync`; share it through an `Arc`.
pub struct FileVault {
    store: Arc<Store>,
    heads: HeadIndex,
    ledger: VersionLedger,
    rows: RowStore,
    access: AccessControl,
    identity: Arc<dyn IdentityProvider>,
    audit: Arc<dyn AuditSink>,
    options: VaultOptions,
}

impl FileVault {
    pub fn new(
        store: Arc<Store>,
        identity: Arc<dyn IdentityProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            heads: HeadIndex::new(store.clone()),
            ledger: VersionLedger::new(store.clone()),
            rows: RowStore::new(store.clone()),
            access: AccessControl::new(store.clone()),
            store,
            identity,
            audit,
            options: VaultOptions::default(),
        }
    }

    pub fn with_options(mut self, options: VaultOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    // ---- mutations ----

    /// Create every file of the batch at version 1, or none of them.
    pub fn upload(&self, caller: &Caller, request: UploadRequest) -> VaultResult<Vec<FileHead>> {
        require_upload(caller)?;
        if request.files.is_empty() {
            return Err(VaultError::Validation("no files to upload".into()));
        }

        let mut names = HashSet::new();
        for file in &request.files {
            let name = file.filename.trim();
            if name.is_empty() {
                return Err(VaultError::Validation("filename must not be empty".into()));
            }
            self.check_size(file.content.len())?;
            if !names.insert(name) {
                return Err(VaultError::Conflict(format!(
                    "filename '{}' appears more than once in the upload",
                    name
                )));
            }
        }

        let tables = parse_batch(&request.files)?;
        let fail_points = self.store.fail_points();
        let mut uow = self.store.begin();
        let mut created = Vec::with_capacity(request.files.len());

        for (file, table) in request.files.iter().zip(&tables) {
            let filename = file.filename.trim();
            // Early answer only; the unique filename constraint decides at commit.
            if self.heads.find_active(filename)?.is_some() {
                return Err(VaultError::Conflict(format!(
                    "filename '{}' is already used by an active file",
                    filename
                )));
            }

            let head = FileHead::new(
                filename,
                caller.user_id,
                table.row_count() as u64,
                file.content.len() as u64,
                file.private,
            );
            self.heads.stage_insert(&mut uow, head.clone());
            fail_points.check(points::STAGE_AFTER_HEAD)?;

            self.ledger
                .stage_append(&mut uow, &head, caller.user_id, content_digest(&file.content));
            fail_points.check(points::STAGE_AFTER_LEDGER)?;

            self.rows.stage_insert(&mut uow, head.id, head.version, table, caller.user_id);
            fail_points.check(points::STAGE_ROWS)?;

            created.push(head);
        }

        self.store.commit(uow)?;

        for head in &created {
            tracing::info!(file_id = %head.id, filename = %head.filename, rows = head.rows, "uploaded");
        }
        self.audit(
            AuditEvent::file(
                "upload",
                caller.user_id,
                format!("Uploaded {} file(s)", created.len()),
            )
            .with_metadata(json!({
                "files": created
                    .iter()
                    .map(|h| json!({ "file_id": h.id, "filename": h.filename, "rows": h.rows }))
                    .collect::<Vec<_>>(),
            })),
        );
        Ok(created)
    }

    /// Store new content as the next version of an existing file.
    pub fn replace(&self, caller: &Caller, request: ReplaceRequest) -> VaultResult<FileHead> {
        require_upload(caller)?;
        self.check_size(request.content.len())?;

        let format_name = match request.source_name.as_deref() {
            Some(name) => name.to_string(),
            None => self.existing(request.file_id)?.filename,
        };
        let table = parser::parse_as(&request.content, TabularFormat::from_file_name(&format_name)?)?;

        let _lock = self.store.lock_file(request.file_id)?;
        let head = self.existing(request.file_id)?;
        self.require_visible(caller, &head)?;

        let next = head.apply(Transition::Advance {
            rows: table.row_count() as u64,
            size: request.content.len() as u64,
            private: None,
        })?;

        let fail_points = self.store.fail_points();
        let mut uow = self.store.begin();
        self.heads.stage_update(&mut uow, head.version, next.clone());
        fail_points.check(points::STAGE_AFTER_HEAD)?;
        self.ledger
            .stage_append(&mut uow, &next, caller.user_id, content_digest(&request.content));
        fail_points.check(points::STAGE_AFTER_LEDGER)?;
        self.rows.stage_insert(&mut uow, next.id, next.version, &table, caller.user_id);
        fail_points.check(points::STAGE_ROWS)?;
        self.store.commit(uow)?;

        tracing::info!(file_id = %next.id, version = next.version, rows = next.rows, "replaced");
        self.audit(
            AuditEvent::file(
                "replace",
                caller.user_id,
                format!("Replaced {} with version {}", next.filename, next.version),
            )
            .with_metadata(json!({ "file_id": next.id, "version": next.version, "rows": next.rows })),
        );
        Ok(next)
    }

    /// Copy an earlier version forward as a new version.
    pub fn revert(&self, caller: &Caller, request: RevertRequest) -> VaultResult<FileHead> {
        require_upload(caller)?;

        let _lock = self.store.lock_file(request.file_id)?;
        let head = self.existing(request.file_id)?;
        self.require_visible(caller, &head)?;

        let target = self
            .ledger
            .entry(request.file_id, request.version)?
            .ok_or_else(|| {
                VaultError::NotFound(format!(
                    "version {} of file {}",
                    request.version, request.file_id
                ))
            })?;

        let next = head.apply(Transition::Advance {
            rows: target.rows,
            size: target.size,
            private: Some(target.private),
        })?;

        let fail_points = self.store.fail_points();
        let mut uow = self.store.begin();
        self.heads.stage_update(&mut uow, head.version, next.clone());
        fail_points.check(points::STAGE_AFTER_HEAD)?;
        self.ledger
            .stage_append(&mut uow, &next, caller.user_id, target.checksum.clone());
        fail_points.check(points::STAGE_AFTER_LEDGER)?;
        self.rows
            .stage_copy(&mut uow, next.id, target.version, next.version, caller.user_id)?;
        fail_points.check(points::STAGE_ROWS)?;
        self.store.commit(uow)?;

        tracing::info!(
            file_id = %next.id,
            from = target.version,
            version = next.version,
            rows = next.rows,
            "reverted"
        );
        self.audit(
            AuditEvent::file(
                "revert",
                caller.user_id,
                format!(
                    "Reverted {} to version {} as version {}",
                    next.filename, target.version, next.version
                ),
            )
            .with_metadata(json!({
                "file_id": next.id,
                "from_version": target.version,
                "version": next.version,
            })),
        );
        Ok(next)
    }

    /// Soft-delete a file. Deleting a deleted file changes nothing.
    pub fn delete(&self, caller: &Caller, file_id: Uuid) -> VaultResult<FileHead> {
        self.set_deleted(caller, file_id, Transition::Delete, "delete")
    }

    /// Undo a soft delete. Resetting an active file changes nothing.
    pub fn reset(&self, caller: &Caller, file_id: Uuid) -> VaultResult<FileHead> {
        self.set_deleted(caller, file_id, Transition::Reset, "reset")
    }

    fn set_deleted(
        &self,
        caller: &Caller,
        file_id: Uuid,
        transition: Transition,
        action: &str,
    ) -> VaultResult<FileHead> {
        let _lock = self.store.lock_file(file_id)?;
        let head = self.existing(file_id)?;
        require_manage(caller, &head)?;

        let next = head.apply(transition)?;
        if next != head {
            let mut uow = self.store.begin();
            self.heads.stage_update(&mut uow, head.version, next.clone());
            self.store.commit(uow)?;
            tracing::info!(file_id = %file_id, deleted = next.deleted, "{}", action);
        } else {
            tracing::debug!(file_id = %file_id, deleted = head.deleted, "{} changed nothing", action);
        }

        self.audit(
            AuditEvent::file(action, caller.user_id, format!("{} {}", action, next.filename))
                .with_metadata(json!({ "file_id": file_id, "deleted": next.deleted })),
        );
        Ok(next)
    }

    /// Grant read access to each listed user. Existing grants are kept.
    pub fn grant(&self, caller: &Caller, file_id: Uuid, user_ids: &[Uuid]) -> VaultResult<Vec<GrantView>> {
        if user_ids.is_empty() {
            return Err(VaultError::Validation("no users to grant".into()));
        }
        if let Some(unknown) = user_ids.iter().find(|id| !self.identity.user_exists(**id)) {
            return Err(VaultError::NotFound(format!("user {}", unknown)));
        }

        let _lock = self.store.lock_file(file_id)?;
        let head = self.existing(file_id)?;
        require_manage(caller, &head)?;

        let mut uow = self.store.begin();
        let grants = self.access.stage_grants(&mut uow, file_id, user_ids)?;
        let added = uow.len();
        if !uow.is_empty() {
            self.store.commit(uow)?;
        }

        tracing::info!(file_id = %file_id, added, requested = user_ids.len(), "granted access");
        self.audit(
            AuditEvent::file(
                "grant",
                caller.user_id,
                format!("Granted {} user(s) access to {}", grants.len(), head.filename),
            )
            .with_metadata(json!({ "file_id": file_id, "user_ids": user_ids, "added": added })),
        );
        Ok(grants.into_iter().map(|g| self.grant_view(g)).collect())
    }

    /// Remove one grant.
    pub fn revoke(&self, caller: &Caller, grant_id: Uuid) -> VaultResult<AccessGrant> {
        let file_id = self
            .access
            .grant(grant_id)?
            .ok_or_else(|| VaultError::NotFound(format!("grant {}", grant_id)))?
            .file_id;

        let _lock = self.store.lock_file(file_id)?;
        let head = self.existing(file_id)?;
        require_manage(caller, &head)?;

        let mut uow = self.store.begin();
        let grant = self.access.stage_revoke(&mut uow, grant_id)?;
        self.store.commit(uow)?;

        tracing::info!(file_id = %file_id, grant_id = %grant_id, "revoked access");
        self.audit(
            AuditEvent::file(
                "revoke",
                caller.user_id,
                format!("Revoked access to {}", head.filename),
            )
            .with_metadata(json!({ "file_id": file_id, "grant_id": grant_id, "user_id": grant.user_id })),
        );
        Ok(grant)
    }

    // ---- reads ----

    /// Files visible to `caller`, oldest upload first.
    pub fn list(&self, caller: &Caller, options: ListOptions) -> VaultResult<Vec<FileListing>> {
        let heads = self.access.visible_heads(caller, options.include_deleted)?;
        Ok(heads.into_iter().map(|h| self.listing(h)).collect())
    }

    /// The active file holding `filename`.
    pub fn find_by_name(&self, caller: &Caller, filename: &str) -> VaultResult<FileListing> {
        let head = self
            .heads
            .find_active(filename)?
            .ok_or_else(|| VaultError::NotFound(format!("file '{}'", filename)))?;
        self.require_visible(caller, &head)?;
        Ok(self.listing(head))
    }

    /// Every version of a file, newest first.
    pub fn history(&self, caller: &Caller, file_id: Uuid) -> VaultResult<Vec<HistoryEntry>> {
        let head = self.existing(file_id)?;
        self.require_visible(caller, &head)?;
        Ok(self
            .ledger
            .history(file_id)?
            .into_iter()
            .map(|entry| HistoryEntry {
                uploader: self.identity.display_name(entry.inserted_by),
                entry,
            })
            .collect())
    }

    /// Rows of one version; the current version when `version` is `None`.
    pub fn data(&self, caller: &Caller, file_id: Uuid, version: Option<u32>) -> VaultResult<DataView> {
        let head = self.existing(file_id)?;
        self.require_visible(caller, &head)?;

        let version = version.unwrap_or(head.version);
        let rows = self
            .rows
            .rows(file_id, version)?
            .ok_or_else(|| VaultError::NotFound(format!("version {} of file {}", version, file_id)))?;
        Ok(DataView {
            file_id,
            filename: head.filename,
            version,
            rows,
        })
    }

    /// Grants on a file with grantee names.
    pub fn list_access(&self, caller: &Caller, file_id: Uuid) -> VaultResult<Vec<GrantView>> {
        let head = self.existing(file_id)?;
        self.require_visible(caller, &head)?;
        Ok(self
            .access
            .grants_for_file(file_id)?
            .into_iter()
            .map(|g| self.grant_view(g))
            .collect())
    }

    // ---- helpers ----

    fn existing(&self, file_id: Uuid) -> VaultResult<FileHead> {
        self.heads
            .get(file_id)?
            .ok_or_else(|| VaultError::NotFound(format!("file {}", file_id)))
    }

    fn require_visible(&self, caller: &Caller, head: &FileHead) -> VaultResult<()> {
        let granted = self.access.has_grant(head.id, caller.user_id)?;
        if is_visible(head, caller, granted) {
            Ok(())
        } else {
            Err(VaultError::Forbidden(format!("no access to file {}", head.id)))
        }
    }

    fn check_size(&self, len: usize) -> VaultResult<()> {
        if len as u64 > self.options.max_upload_bytes {
            return Err(VaultError::Validation(format!(
                "content is {} bytes, limit is {}",
                len, self.options.max_upload_bytes
            )));
        }
        Ok(())
    }

    fn listing(&self, head: FileHead) -> FileListing {
        let uploader = self.identity.display_name(head.owner_id);
        FileListing::new(head, uploader)
    }

    fn grant_view(&self, grant: AccessGrant) -> GrantView {
        GrantView {
            user_name: self.identity.display_name(grant.user_id),
            grant,
        }
    }

    fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(&event) {
            tracing::warn!(action = %event.action, error = %e, "audit delivery failed");
        }
    }
}

fn require_upload(caller: &Caller) -> VaultResult<()> {
    if caller.capabilities.can_upload {
        Ok(())
    } else {
        Err(VaultError::Forbidden(format!("role '{}' cannot upload", caller.role)))
    }
}

fn require_manage(caller: &Caller, head: &FileHead) -> VaultResult<()> {
    if caller.can_manage(head.owner_id) {
        Ok(())
    } else {
        Err(VaultError::Forbidden(format!("not the owner of file {}", head.id)))
    }
}

fn parse_upload(file: &UploadFile) -> VaultResult<ParsedTable> {
    let format = TabularFormat::from_file_name(file.format_name())?;
    Ok(parser::parse_as(&file.content, format)?)
}

/// Parse every file of a batch, one scoped thread per file.
fn parse_batch(files: &[UploadFile]) -> VaultResult<Vec<ParsedTable>> {
    if let [single] = files {
        return Ok(vec![parse_upload(single)?]);
    }
    thread::scope(|scope| {
        let handles: Vec<_> = files
            .iter()
            .map(|file| scope.spawn(move || parse_upload(file)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(VaultError::Validation("parser panicked".into())))
            })
            .collect()
    })
}
