//! # Caller Context
//!
//! Identity and capabilities carried with each request, in the shape the
//! session layer hands them over.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability flags attached to a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub can_upload: bool,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_approve: bool,
    #[serde(default)]
    pub can_approve_all: bool,
}

impl Capabilities {
    /// Every capability granted.
    pub fn all() -> Self {
        Self {
            can_upload: true,
            can_view: true,
            can_approve: true,
            can_approve_all: true,
        }
    }

    /// May see every file regardless of privacy, ownership or grants.
    pub fn full_view(&self) -> bool {
        self.can_approve_all
    }
}

/// The authenticated user behind a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: String,
    pub capabilities: Capabilities,
}

impl Caller {
    pub fn new(user_id: Uuid, role: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            user_id,
            role: role.into(),
            capabilities,
        }
    }

    /// Caller with every capability, for administrative tooling.
    pub fn admin(user_id: Uuid) -> Self {
        Self::new(user_id, "Admin", Capabilities::all())
    }

    /// Owner of the file, or a role allowed to act on every file.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.capabilities.can_approve_all
    }
}
