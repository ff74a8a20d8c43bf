//! # File Lifecycle
//!
//! State is `(version, deleted)`:
//!
//! ```text
//! upload              -> (1, false)
//! replace/revert      (v, false) -> (v + 1, false)
//! delete              (v, false) -> (v, true)
//! reset               (v, true)  -> (v, false)
//! ```
//!
//! No transition lowers the version or skips a number. Writing a new
//! version while deleted is rejected; the file must be reset first.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use super::record::FileHead;

/// Lifecycle violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("File {0} is deleted; reset it before writing a new version")]
    Deleted(Uuid),

    #[error("File {0} has no version numbers left")]
    VersionExhausted(Uuid),
}

/// A requested state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// New version with fresh stats. `private` is only set by revert.
    Advance {
        rows: u64,
        size: u64,
        private: Option<bool>,
    },
    Delete,
    Reset,
}

impl FileHead {
    /// Compute the head that results from `transition`.
    ///
    /// Delete on a deleted head and Reset on an active one return an
    /// unchanged copy.
    pub fn apply(&self, transition: Transition) -> Result<FileHead, LifecycleError> {
        let mut next = self.clone();
        match transition {
            Transition::Advance { rows, size, private } => {
                if self.deleted {
                    return Err(LifecycleError::Deleted(self.id));
                }
                next.version = self
                    .version
                    .checked_add(1)
                    .ok_or(LifecycleError::VersionExhausted(self.id))?;
                next.rows = rows;
                next.size = size;
                if let Some(private) = private {
                    next.private = private;
                }
            }
            Transition::Delete => {
                if self.deleted {
                    return Ok(next);
                }
                next.deleted = true;
            }
            Transition::Reset => {
                if !self.deleted {
                    return Ok(next);
                }
                next.deleted = false;
            }
        }
        next.updated_at = Utc::now();
        Ok(next)
    }
}
