//! # Tables
//!
//! The four logical tables (heads, ledger, rows, grants) and the
//! constraints every commit must satisfy.
//!
//! ## Constraints
//! - Filenames are unique among active (non-deleted) heads
//! - A head update names the version it expects to replace
//! - Ledger versions per file are contiguous from 1, never reused
//! - Every new ledger entry comes with its row set, written once
//! - After a commit, each touched head points at its latest ledger entry
//! - At most one grant per (file, user)
//!
//! Validation runs against an overlay of the staged writes, so a batch is
//! checked as a whole before any table is touched. Applying a validated
//! batch cannot fail.

use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::access::AccessGrant;
use crate::head::FileHead;
use crate::ledger::VersionEntry;
use crate::rows::RowRecord;

use super::errors::Constraint;
use super::unit_of_work::Write;

/// In-memory state of the store.
#[derive(Debug, Default)]
pub struct Tables {
    heads: HashMap<Uuid, FileHead>,
    active_names: HashMap<String, Uuid>,
    ledger: BTreeMap<(Uuid, u32), VersionEntry>,
    rows: BTreeMap<(Uuid, u32), Vec<RowRecord>>,
    grants: HashMap<Uuid, AccessGrant>,
    grant_pairs: HashMap<(Uuid, Uuid), Uuid>,
    last_sequence: u64,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- heads ----

    pub fn head(&self, file_id: Uuid) -> Option<&FileHead> {
        self.heads.get(&file_id)
    }

    /// The active head holding `filename`, if any.
    pub fn active_head(&self, filename: &str) -> Option<&FileHead> {
        self.active_names
            .get(filename)
            .and_then(|id| self.heads.get(id))
    }

    pub fn heads(&self) -> impl Iterator<Item = &FileHead> {
        self.heads.values()
    }

    pub fn head_count(&self) -> usize {
        self.heads.len()
    }

    // ---- ledger ----

    pub fn version(&self, file_id: Uuid, version: u32) -> Option<&VersionEntry> {
        self.ledger.get(&(file_id, version))
    }

    /// Ledger entries of a file in ascending version order.
    pub fn versions(&self, file_id: Uuid) -> impl DoubleEndedIterator<Item = &VersionEntry> {
        self.ledger
            .range((file_id, 0)..=(file_id, u32::MAX))
            .map(|(_, entry)| entry)
    }

    pub fn latest_version(&self, file_id: Uuid) -> Option<u32> {
        self.versions(file_id).next_back().map(|e| e.version)
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    // ---- rows ----

    pub fn rows(&self, file_id: Uuid, version: u32) -> Option<&[RowRecord]> {
        self.rows.get(&(file_id, version)).map(Vec::as_slice)
    }

    /// Total row records across every file and version.
    pub fn row_record_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    // ---- grants ----

    pub fn grant(&self, grant_id: Uuid) -> Option<&AccessGrant> {
        self.grants.get(&grant_id)
    }

    pub fn grant_for(&self, file_id: Uuid, user_id: Uuid) -> Option<&AccessGrant> {
        self.grant_pairs
            .get(&(file_id, user_id))
            .and_then(|id| self.grants.get(id))
    }

    pub fn grants_for_file(&self, file_id: Uuid) -> impl Iterator<Item = &AccessGrant> {
        self.grants.values().filter(move |g| g.file_id == file_id)
    }

    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    // ---- commit ----

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Check a batch against current state without modifying anything.
    pub fn validate(&self, writes: &[Write]) -> Result<(), Constraint> {
        let mut overlay = Overlay::new(self);
        for write in writes {
            overlay.check(write)?;
        }
        overlay.finish()
    }

    /// Apply a validated batch.
    pub(crate) fn apply(&mut self, sequence: u64, writes: Vec<Write>) {
        for write in writes {
            match write {
                Write::InsertHead(head) => {
                    if head.is_active() {
                        self.active_names.insert(head.filename.clone(), head.id);
                    }
                    self.heads.insert(head.id, head);
                }
                Write::UpdateHead { head, .. } => {
                    let was_active = self.heads.get(&head.id).map(FileHead::is_active);
                    match (was_active, head.is_active()) {
                        (Some(true), false) => {
                            if self.active_names.get(&head.filename) == Some(&head.id) {
                                self.active_names.remove(&head.filename);
                            }
                        }
                        (Some(false), true) | (None, true) => {
                            self.active_names.insert(head.filename.clone(), head.id);
                        }
                        _ => {}
                    }
                    self.heads.insert(head.id, head);
                }
                Write::AppendVersion(entry) => {
                    self.ledger.insert((entry.file_id, entry.version), entry);
                }
                Write::InsertRows { file_id, version, rows } => {
                    self.rows.insert((file_id, version), rows);
                }
                Write::InsertGrant(grant) => {
                    self.grant_pairs.insert((grant.file_id, grant.user_id), grant.id);
                    self.grants.insert(grant.id, grant);
                }
                Write::DeleteGrant { grant_id } => {
                    if let Some(grant) = self.grants.remove(&grant_id) {
                        self.grant_pairs.remove(&(grant.file_id, grant.user_id));
                    }
                }
            }
        }
        self.last_sequence = sequence;
    }
}

/// Staged view of the tables while a batch is validated.
struct Overlay<'a> {
    tables: &'a Tables,
    heads: HashMap<Uuid, FileHead>,
    /// Name ownership changes; `None` frees the name.
    names: HashMap<String, Option<Uuid>>,
    latest: HashMap<Uuid, u32>,
    versions: HashSet<(Uuid, u32)>,
    rows: HashSet<(Uuid, u32)>,
    /// Grant changes; `None` marks a deletion.
    grants: HashMap<Uuid, Option<(Uuid, Uuid)>>,
    pairs: HashMap<(Uuid, Uuid), Option<Uuid>>,
}

impl<'a> Overlay<'a> {
    fn new(tables: &'a Tables) -> Self {
        Self {
            tables,
            heads: HashMap::new(),
            names: HashMap::new(),
            latest: HashMap::new(),
            versions: HashSet::new(),
            rows: HashSet::new(),
            grants: HashMap::new(),
            pairs: HashMap::new(),
        }
    }

    fn head(&self, file_id: Uuid) -> Option<&FileHead> {
        self.heads
            .get(&file_id)
            .or_else(|| self.tables.heads.get(&file_id))
    }

    fn name_holder(&self, filename: &str) -> Option<Uuid> {
        match self.names.get(filename) {
            Some(holder) => *holder,
            None => self.tables.active_names.get(filename).copied(),
        }
    }

    fn latest(&self, file_id: Uuid) -> Option<u32> {
        self.latest
            .get(&file_id)
            .copied()
            .or_else(|| self.tables.latest_version(file_id))
    }

    fn has_version(&self, file_id: Uuid, version: u32) -> bool {
        self.versions.contains(&(file_id, version))
            || self.tables.ledger.contains_key(&(file_id, version))
    }

    fn has_rows(&self, file_id: Uuid, version: u32) -> bool {
        self.rows.contains(&(file_id, version)) || self.tables.rows.contains_key(&(file_id, version))
    }

    fn grant_pair(&self, grant_id: Uuid) -> Option<(Uuid, Uuid)> {
        match self.grants.get(&grant_id) {
            Some(pair) => *pair,
            None => self
                .tables
                .grants
                .get(&grant_id)
                .map(|g| (g.file_id, g.user_id)),
        }
    }

    fn pair_holder(&self, pair: (Uuid, Uuid)) -> Option<Uuid> {
        match self.pairs.get(&pair) {
            Some(holder) => *holder,
            None => self.tables.grant_pairs.get(&pair).copied(),
        }
    }

    fn check(&mut self, write: &Write) -> Result<(), Constraint> {
        match write {
            Write::InsertHead(head) => {
                if self.head(head.id).is_some() {
                    return Err(Constraint::DuplicateFile(head.id));
                }
                if head.is_active() {
                    if self.name_holder(&head.filename).is_some() {
                        return Err(Constraint::DuplicateFilename(head.filename.clone()));
                    }
                    self.names.insert(head.filename.clone(), Some(head.id));
                }
                self.heads.insert(head.id, head.clone());
            }

            Write::UpdateHead { expected_version, head } => {
                let current = self
                    .head(head.id)
                    .cloned()
                    .ok_or(Constraint::MissingFile(head.id))?;

                if current.version != *expected_version {
                    return Err(Constraint::StaleHead {
                        file_id: head.id,
                        expected: *expected_version,
                        found: current.version,
                    });
                }
                if head.version < current.version {
                    return Err(Constraint::VersionGap {
                        file_id: head.id,
                        version: head.version,
                        latest: current.version,
                    });
                }
                if head.filename != current.filename || head.owner_id != current.owner_id {
                    return Err(Constraint::ImmutableIdentity(head.id));
                }

                match (current.is_active(), head.is_active()) {
                    (true, false) => {
                        self.names.insert(head.filename.clone(), None);
                    }
                    (false, true) => {
                        if let Some(holder) = self.name_holder(&head.filename) {
                            if holder != head.id {
                                return Err(Constraint::DuplicateFilename(head.filename.clone()));
                            }
                        }
                        self.names.insert(head.filename.clone(), Some(head.id));
                    }
                    _ => {}
                }
                self.heads.insert(head.id, head.clone());
            }

            Write::AppendVersion(entry) => {
                if self.head(entry.file_id).is_none() {
                    return Err(Constraint::MissingFile(entry.file_id));
                }
                if self.has_version(entry.file_id, entry.version) {
                    return Err(Constraint::DuplicateVersion {
                        file_id: entry.file_id,
                        version: entry.version,
                    });
                }
                let latest = self.latest(entry.file_id).unwrap_or(0);
                if Some(entry.version) != latest.checked_add(1) {
                    return Err(Constraint::VersionGap {
                        file_id: entry.file_id,
                        version: entry.version,
                        latest,
                    });
                }
                self.versions.insert((entry.file_id, entry.version));
                self.latest.insert(entry.file_id, entry.version);
            }

            Write::InsertRows { file_id, version, rows } => {
                if !self.has_version(*file_id, *version) {
                    return Err(Constraint::MissingVersion {
                        file_id: *file_id,
                        version: *version,
                    });
                }
                if self.has_rows(*file_id, *version) {
                    return Err(Constraint::DuplicateRows {
                        file_id: *file_id,
                        version: *version,
                    });
                }
                if rows.iter().any(|r| r.file_id != *file_id || r.version != *version) {
                    return Err(Constraint::MisplacedRow {
                        file_id: *file_id,
                        version: *version,
                    });
                }
                self.rows.insert((*file_id, *version));
            }

            Write::InsertGrant(grant) => {
                if self.grant_pair(grant.id).is_some() {
                    return Err(Constraint::DuplicateGrant(grant.id));
                }
                if self.head(grant.file_id).is_none() {
                    return Err(Constraint::MissingFile(grant.file_id));
                }
                let pair = (grant.file_id, grant.user_id);
                if self.pair_holder(pair).is_some() {
                    return Err(Constraint::DuplicateGrantPair {
                        file_id: grant.file_id,
                        user_id: grant.user_id,
                    });
                }
                self.grants.insert(grant.id, Some(pair));
                self.pairs.insert(pair, Some(grant.id));
            }

            Write::DeleteGrant { grant_id } => {
                let pair = self
                    .grant_pair(*grant_id)
                    .ok_or(Constraint::MissingGrant(*grant_id))?;
                self.grants.insert(*grant_id, None);
                self.pairs.insert(pair, None);
            }
        }
        Ok(())
    }

    /// Cross-write checks once every write has been seen.
    fn finish(self) -> Result<(), Constraint> {
        for &(file_id, version) in &self.versions {
            if !self.has_rows(file_id, version) {
                return Err(Constraint::MissingVersionRows { file_id, version });
            }
        }

        let touched: HashSet<Uuid> = self
            .heads
            .keys()
            .chain(self.latest.keys())
            .copied()
            .collect();

        for file_id in touched {
            let head = self.head(file_id).ok_or(Constraint::MissingFile(file_id))?;
            let ledger = self.latest(file_id).unwrap_or(0);
            if head.version != ledger {
                return Err(Constraint::HeadLedgerMismatch {
                    file_id,
                    head: head.version,
                    ledger,
                });
            }
        }
        Ok(())
    }
}
