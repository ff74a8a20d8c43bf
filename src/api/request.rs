//! API request types
//!
//! One JSON object per request. Every request names the acting user and
//! an `op`; file content is referenced by path.
//!
//! ```json
//! {"id": 1, "user_id": "...", "op": "upload", "paths": ["in/sales.csv"], "filenames": ["sales.csv"], "private": [false]}
//! {"id": 2, "user_id": "...", "op": "revert", "file_id": "...", "version": 1}
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::{ApiError, ApiResult};

/// Operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Parallel arrays of content paths, target names and privacy flags
    Upload {
        paths: Vec<PathBuf>,
        filenames: Vec<String>,
        private: Vec<bool>,
    },
    Replace {
        file_id: Uuid,
        path: PathBuf,
    },
    Revert {
        file_id: Uuid,
        version: u32,
    },
    Delete {
        file_id: Uuid,
    },
    Reset {
        file_id: Uuid,
    },
    List {
        #[serde(default)]
        include_deleted: bool,
    },
    Find {
        filename: String,
    },
    History {
        file_id: Uuid,
    },
    /// Rows of a version, the current one when `version` is absent
    Data {
        file_id: Uuid,
        #[serde(default)]
        version: Option<u32>,
    },
    Grant {
        file_id: Uuid,
        user_ids: Vec<Uuid>,
    },
    Revoke {
        grant_id: Uuid,
    },
    Access {
        file_id: Uuid,
    },
}

impl Request {
    /// Operation name, as in the `op` field
    pub fn op(&self) -> &'static str {
        match self {
            Request::Upload { .. } => "upload",
            Request::Replace { .. } => "replace",
            Request::Revert { .. } => "revert",
            Request::Delete { .. } => "delete",
            Request::Reset { .. } => "reset",
            Request::List { .. } => "list",
            Request::Find { .. } => "find",
            Request::History { .. } => "history",
            Request::Data { .. } => "data",
            Request::Grant { .. } => "grant",
            Request::Revoke { .. } => "revoke",
            Request::Access { .. } => "access",
        }
    }
}

/// Request with caller identity and an optional correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Echoed back in the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub request: Request,
}

impl Envelope {
    /// Parse a JSON request string
    pub fn parse(json: &str) -> ApiResult<Self> {
        serde_json::from_str(json).map_err(|e| ApiError::invalid_request(e.to_string()))
    }

    /// Best-effort correlation id of a request that failed to parse.
    pub fn peek_id(json: &str) -> Option<Value> {
        serde_json::from_str::<Value>(json)
            .ok()
            .and_then(|v| v.get("id").cloned())
    }
}
