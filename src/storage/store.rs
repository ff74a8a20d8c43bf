//! # Store
//!
//! Shared storage handle: tables behind a reader/writer lock, a commit log,
//! per-file locks and fail points. Components receive an `Arc<Store>`.
//!
//! Lock order is always file lock, then table lock. Table read guards are
//! never held while committing.

use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard};
use uuid::Uuid;

use super::commit_log::{CommitLog, MemoryCommitLog};
use super::errors::{StorageError, StorageResult};
use super::fail_points::{points, FailPoints};
use super::locks::{FileLockGuard, FileLocks};
use super::tables::Tables;
use super::unit_of_work::{CommitBatch, UnitOfWork};

/// Default bound on every lock wait.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for opening a store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Upper bound on waiting for a file or table lock
    pub lock_timeout: Duration,
    pub fail_points: FailPoints,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            fail_points: FailPoints::new(),
        }
    }
}

impl StoreOptions {
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_fail_points(mut self, fail_points: FailPoints) -> Self {
        self.fail_points = fail_points;
        self
    }
}

/// The storage engine.
#[derive(Debug)]
pub struct Store {
    tables: RwLock<Tables>,
    log: Box<dyn CommitLog>,
    locks: FileLocks,
    fail_points: FailPoints,
    lock_timeout: Duration,
}

impl Store {
    /// Empty store with a memory commit log.
    pub fn in_memory() -> Self {
        Self::with_tables(Box::new(MemoryCommitLog::new()), Tables::new(), StoreOptions::default())
    }

    /// Empty in-memory store with custom options.
    pub fn in_memory_with(options: StoreOptions) -> Self {
        Self::with_tables(Box::new(MemoryCommitLog::new()), Tables::new(), options)
    }

    /// Open a store over `log`, rebuilding the tables by replay.
    ///
    /// A batch that is out of sequence or violates a constraint during
    /// replay means the log was not written by this engine, and is
    /// reported as corruption.
    pub fn open(log: Box<dyn CommitLog>, options: StoreOptions) -> StorageResult<Self> {
        let mut tables = Tables::new();
        let batches = log.replay()?;
        let replayed = batches.len();

        for batch in batches {
            let expected = tables.last_sequence() + 1;
            if batch.sequence != expected {
                return Err(StorageError::Corruption(format!(
                    "commit {} found where {} was expected",
                    batch.sequence, expected
                )));
            }
            tables.validate(&batch.writes).map_err(|c| {
                StorageError::Corruption(format!("commit {} violates {}", batch.sequence, c))
            })?;
            tables.apply(batch.sequence, batch.writes);
        }

        tracing::info!(
            commits = replayed,
            files = tables.head_count(),
            versions = tables.ledger_len(),
            "store opened"
        );

        Ok(Self::with_tables(log, tables, options))
    }

    fn with_tables(log: Box<dyn CommitLog>, tables: Tables, options: StoreOptions) -> Self {
        Self {
            tables: RwLock::new(tables),
            log,
            locks: FileLocks::new(options.lock_timeout),
            fail_points: options.fail_points,
            lock_timeout: options.lock_timeout,
        }
    }

    pub fn fail_points(&self) -> &FailPoints {
        &self.fail_points
    }

    /// Start staging writes.
    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new()
    }

    /// Exclusive lock on one file for the duration of a mutation.
    pub fn lock_file(&self, file_id: Uuid) -> StorageResult<FileLockGuard<'_>> {
        self.locks.acquire(file_id)
    }

    /// Latest committed state.
    pub fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .try_read_for(self.lock_timeout)
            .ok_or_else(|| {
                StorageError::LockTimeout(format!("table read lock after {:?}", self.lock_timeout))
            })
    }

    /// Validate, log and apply a unit of work as one step.
    ///
    /// Returns the commit sequence number. On any error the tables and the
    /// log are unchanged.
    pub fn commit(&self, uow: UnitOfWork) -> StorageResult<u64> {
        let mut tables = self
            .tables
            .try_write_for(self.lock_timeout)
            .ok_or_else(|| {
                StorageError::LockTimeout(format!("table write lock after {:?}", self.lock_timeout))
            })?;

        tables.validate(uow.writes())?;
        self.fail_points.check(points::COMMIT_BEFORE_LOG)?;

        let sequence = tables.last_sequence() + 1;
        let batch = CommitBatch::new(sequence, uow.into_writes());
        self.log.append(&batch)?;

        let writes = batch.writes.len();
        tables.apply(sequence, batch.writes);
        tracing::debug!(sequence, writes, "committed");
        Ok(sequence)
    }
}
