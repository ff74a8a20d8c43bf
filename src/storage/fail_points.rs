//! Fail point injection for testing atomicity
//!
//! A fail point is a named location in a write path. When armed, the code
//! at that location returns [`StorageError::Injected`] instead of
//! continuing, which lets tests prove that a half-finished operation
//! leaves nothing behind.
//!
//! Points can be armed programmatically or, for whole-process runs, via
//! the `TABVAULT_FAIL_POINT` environment variable (comma separated).
//!
//! ```bash
//! TABVAULT_FAIL_POINT=commit_before_log tabvault serve --config vault.json
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::errors::{StorageError, StorageResult};

/// Environment variable read by [`FailPoints::from_env`].
pub const FAIL_POINT_ENV: &str = "TABVAULT_FAIL_POINT";

/// Shared set of armed fail points.
#[derive(Debug, Clone, Default)]
pub struct FailPoints {
    armed: Arc<Mutex<HashSet<String>>>,
}

impl FailPoints {
    /// No point armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm every point named in `TABVAULT_FAIL_POINT`.
    pub fn from_env() -> Self {
        let points = Self::new();
        if let Ok(value) = std::env::var(FAIL_POINT_ENV) {
            for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                points.arm(name);
            }
        }
        points
    }

    pub fn arm(&self, name: &str) {
        self.armed.lock().insert(name.to_string());
    }

    pub fn disarm(&self, name: &str) {
        self.armed.lock().remove(name);
    }

    pub fn is_armed(&self, name: &str) -> bool {
        self.armed.lock().contains(name)
    }

    /// Fail if `name` is armed.
    #[inline]
    pub fn check(&self, name: &str) -> StorageResult<()> {
        if self.is_armed(name) {
            tracing::warn!(point = name, "injected failure");
            return Err(StorageError::Injected(name.to_string()));
        }
        Ok(())
    }
}

/// All defined fail point names
pub mod points {
    // Service write paths, between staging steps
    pub const STAGE_AFTER_HEAD: &str = "stage_after_head";
    pub const STAGE_AFTER_LEDGER: &str = "stage_after_ledger";
    pub const STAGE_ROWS: &str = "stage_rows";

    // Commit path
    pub const COMMIT_BEFORE_LOG: &str = "commit_before_log";

    /// Get all fail point names
    pub fn all() -> &'static [&'static str] {
        &[
            STAGE_AFTER_HEAD,
            STAGE_AFTER_LEDGER,
            STAGE_ROWS,
            COMMIT_BEFORE_LOG,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disarmed_by_default() {
        let fp = FailPoints::new();
        for name in points::all() {
            assert!(fp.check(name).is_ok());
        }
    }

    #[test]
    fn test_arm_and_disarm() {
        let fp = FailPoints::new();
        fp.arm(points::STAGE_ROWS);
        assert!(matches!(
            fp.check(points::STAGE_ROWS),
            Err(StorageError::Injected(name)) if name == points::STAGE_ROWS
        ));
        assert!(fp.check(points::COMMIT_BEFORE_LOG).is_ok());

        fp.disarm(points::STAGE_ROWS);
        assert!(fp.check(points::STAGE_ROWS).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let fp = FailPoints::new();
        let other = fp.clone();
        other.arm(points::COMMIT_BEFORE_LOG);
        assert!(fp.is_armed(points::COMMIT_BEFORE_LOG));
    }

    #[test]
    fn test_names_unique() {
        let all = points::all();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
    }
}
