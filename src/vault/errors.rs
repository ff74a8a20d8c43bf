//! # File Service Errors
//!
//! Callers map these by kind through [`VaultError::code`], never by
//! message text.

use thiserror::Error;

use crate::head::LifecycleError;
use crate::parser::ParseError;
use crate::storage::{Constraint, StorageError};

/// Result type for file service operations
pub type VaultResult<T> = Result<T, VaultError>;

/// File service errors
#[derive(Debug, Clone, Error)]
pub enum VaultError {
    /// Malformed or mismatched input, rejected before any write
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Duplicate filename or invalid lifecycle state
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing capability or ownership
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Storage failure; the operation was rolled back
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl VaultError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::Validation(_) => "VALIDATION_ERROR",
            VaultError::Conflict(_) => "CONFLICT",
            VaultError::NotFound(_) => "NOT_FOUND",
            VaultError::Forbidden(_) => "FORBIDDEN",
            VaultError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            VaultError::Validation(_) => 400,
            VaultError::Conflict(_) => 409,
            VaultError::NotFound(_) => 404,
            VaultError::Forbidden(_) => 403,
            VaultError::Storage(e) if e.is_retryable() => 503,
            VaultError::Storage(_) => 500,
        }
    }

    /// Whether the whole operation may be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::Storage(e) if e.is_retryable())
    }
}

impl From<StorageError> for VaultError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Constraint(constraint) => constraint.into(),
            other => VaultError::Storage(other),
        }
    }
}

impl From<Constraint> for VaultError {
    fn from(constraint: Constraint) -> Self {
        match constraint {
            Constraint::DuplicateFilename(_)
            | Constraint::StaleHead { .. }
            | Constraint::DuplicateVersion { .. }
            | Constraint::DuplicateRows { .. }
            | Constraint::DuplicateGrantPair { .. } => VaultError::Conflict(constraint.to_string()),
            Constraint::MissingFile(_) | Constraint::MissingGrant(_) | Constraint::MissingVersion { .. } => {
                VaultError::NotFound(constraint.to_string())
            }
            other => VaultError::Storage(StorageError::Constraint(other)),
        }
    }
}

impl From<ParseError> for VaultError {
    fn from(err: ParseError) -> Self {
        VaultError::Validation(err.to_string())
    }
}

impl From<LifecycleError> for VaultError {
    fn from(err: LifecycleError) -> Self {
        VaultError::Conflict(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_codes() {
        assert_eq!(VaultError::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(VaultError::Conflict("x".into()).status_code(), 409);
        assert_eq!(VaultError::NotFound("x".into()).status_code(), 404);
        assert_eq!(VaultError::Forbidden("x".into()).code(), "FORBIDDEN");
    }

    #[test]
    fn test_constraint_mapping() {
        let err: VaultError = StorageError::from(Constraint::DuplicateFilename("a.csv".into())).into();
        assert!(matches!(err, VaultError::Conflict(ref m) if m.contains("a.csv")));

        let err: VaultError = StorageError::from(Constraint::MissingGrant(Uuid::nil())).into();
        assert!(matches!(err, VaultError::NotFound(_)));

        let err: VaultError = StorageError::from(Constraint::HeadLedgerMismatch {
            file_id: Uuid::nil(),
            head: 2,
            ledger: 1,
        })
        .into();
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_storage() {
        let err: VaultError = StorageError::LockTimeout("file".into()).into();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_parse_errors_are_validation() {
        let err: VaultError = ParseError::EmptyContent.into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        let err: VaultError = ParseError::UnsupportedFormat("pdf".into()).into();
        assert!(err.to_string().contains("pdf"));
    }
}
