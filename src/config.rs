//! # Configuration
//!
//! JSON configuration file:
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/tabvault",
//!   "lock_timeout_ms": 5000,
//!   "max_upload_bytes": 52428800,
//!   "workers": 4,
//!   "log_level": "info",
//!   "audit_log": "/var/log/tabvault/audit.log",
//!   "roles": { "Admin": { "can_upload": true, "can_approve_all": true } },
//!   "users": [{ "id": "...", "firstname": "Ada", "lastname": "Lovelace", "role": "Admin" }]
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{Capabilities, Directory, UserProfile};
use crate::vault::DEFAULT_MAX_UPLOAD_BYTES;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Directory holding the commit log (required)
    pub data_dir: PathBuf,

    /// Bound on every lock wait (default 5000)
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Per-file content limit (default 50 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Concurrent requests in `serve` (default 4)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Default tracing filter when `RUST_LOG` is unset (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON-lines audit file; audit events are dropped when absent
    #[serde(default)]
    pub audit_log: Option<PathBuf>,

    #[serde(default)]
    pub roles: BTreeMap<String, Capabilities>,

    #[serde(default)]
    pub users: Vec<UserProfile>,
}

fn default_lock_timeout_ms() -> u64 {
    5000
}
fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}
fn default_workers() -> usize {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}

impl VaultConfig {
    /// Minimal configuration with defaults for everything but the data dir.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock_timeout_ms: default_lock_timeout_ms(),
            max_upload_bytes: default_max_upload_bytes(),
            workers: default_workers(),
            log_level: default_log_level(),
            audit_log: None,
            roles: BTreeMap::new(),
            users: Vec::new(),
        }
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: VaultConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid("lock_timeout_ms must be > 0".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be > 0".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be > 0".into()));
        }

        let mut ids = HashSet::new();
        for user in &self.users {
            if !ids.insert(user.id) {
                return Err(ConfigError::Invalid(format!("duplicate user id {}", user.id)));
            }
            if !self.roles.contains_key(&user.role) {
                return Err(ConfigError::Invalid(format!(
                    "user {} has undefined role '{}'",
                    user.id, user.role
                )));
            }
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Users and roles as an identity directory.
    pub fn directory(&self) -> Directory {
        let directory = self
            .roles
            .iter()
            .fold(Directory::new(), |dir, (name, caps)| dir.with_role(name.clone(), *caps));
        self.users
            .iter()
            .cloned()
            .fold(directory, |dir, user| dir.with_user(user))
    }
}
