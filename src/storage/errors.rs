//! # Storage Errors
//!
//! Every error is either retryable (the whole logical operation may be
//! attempted again) or fatal (retrying cannot succeed).

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Whether a caller may retry after this error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Transient; safe to retry the whole operation
    Retryable,
    /// Permanent for this input or this store
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Retryable => write!(f, "RETRYABLE"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// A table constraint rejected a unit of work
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Constraint {
    #[error("filename '{0}' is already used by an active file")]
    DuplicateFilename(String),

    #[error("file {0} already exists")]
    DuplicateFile(Uuid),

    #[error("file {0} does not exist")]
    MissingFile(Uuid),

    #[error("file {file_id} expected at version {expected}, found {found}")]
    StaleHead { file_id: Uuid, expected: u32, found: u32 },

    #[error("file {0} cannot be renamed or re-owned")]
    ImmutableIdentity(Uuid),

    #[error("file {file_id} version {version} already exists")]
    DuplicateVersion { file_id: Uuid, version: u32 },

    #[error("file {file_id} version {version} does not follow version {latest}")]
    VersionGap { file_id: Uuid, version: u32, latest: u32 },

    #[error("file {file_id} version {version} has no ledger entry")]
    MissingVersion { file_id: Uuid, version: u32 },

    #[error("file {file_id} version {version} was appended without its rows")]
    MissingVersionRows { file_id: Uuid, version: u32 },

    #[error("rows for file {file_id} version {version} already written")]
    DuplicateRows { file_id: Uuid, version: u32 },

    #[error("rows for file {file_id} version {version} are tagged for another version")]
    MisplacedRow { file_id: Uuid, version: u32 },

    #[error("head of file {file_id} points at version {head} but ledger ends at {ledger}")]
    HeadLedgerMismatch { file_id: Uuid, head: u32, ledger: u32 },

    #[error("grant {0} already exists")]
    DuplicateGrant(Uuid),

    #[error("user {user_id} already has a grant on file {file_id}")]
    DuplicateGrantPair { file_id: Uuid, user_id: Uuid },

    #[error("grant {0} does not exist")]
    MissingGrant(Uuid),
}

/// File storage engine errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Timed out waiting for {0}")]
    LockTimeout(String),

    #[error("Constraint violation: {0}")]
    Constraint(#[from] Constraint),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Commit log corrupted: {0}")]
    Corruption(String),

    #[error("Injected failure at {0}")]
    Injected(String),
}

impl StorageError {
    pub fn io(context: impl fmt::Display, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", context, err))
    }

    pub fn severity(&self) -> Severity {
        match self {
            StorageError::LockTimeout(_) | StorageError::Io(_) | StorageError::Injected(_) => {
                Severity::Retryable
            }
            StorageError::Constraint(_) | StorageError::Corruption(_) => Severity::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == Severity::Retryable
    }
}
