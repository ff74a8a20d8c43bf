//! Table storage engine for tabvault
//!
//! Holds the four logical tables (heads, ledger, rows, grants) and the only
//! path that changes them: a staged [`UnitOfWork`] committed through
//! [`Store::commit`].
//!
//! # Design Principles
//!
//! - All or nothing: a unit of work is validated as a whole, logged, then applied
//! - Constraints are checked at commit under the table write lock
//! - Committed batches are appended to a [`CommitLog`] before they are applied
//! - Tables are rebuilt from the log on open
//! - Every lock wait is bounded

mod checksum;
mod commit_log;
mod errors;
mod fail_points;
mod local;
mod locks;
mod store;
mod tables;
mod unit_of_work;

pub use checksum::{compute_checksum, content_digest, verify_checksum};
pub use commit_log::{CommitLog, MemoryCommitLog};
pub use errors::{Constraint, Severity, StorageError, StorageResult};
pub use fail_points::{points, FailPoints, FAIL_POINT_ENV};
pub use local::{LocalCommitLog, COMMIT_LOG_FILE};
pub use locks::{FileLockGuard, FileLocks};
pub use store::{Store, StoreOptions, DEFAULT_LOCK_TIMEOUT};
pub use tables::Tables;
pub use unit_of_work::{CommitBatch, UnitOfWork, Write};
