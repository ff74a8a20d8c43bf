//! # User Directory
//!
//! Resolves user ids into callers and display names. The session layer
//! and role administration live outside this crate; [`Directory`] is the
//! config-backed stand-in for both.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::caller::{Caller, Capabilities};

/// Maps a role name to its capability flags.
pub trait CapabilityProvider: Send + Sync {
    fn capabilities(&self, role: &str) -> Option<Capabilities>;
}

/// Supplies the identity behind each call and uploader display names.
pub trait IdentityProvider: Send + Sync {
    /// Resolve an authenticated user id into a caller.
    fn resolve(&self, user_id: Uuid) -> Option<Caller>;

    /// "Firstname Lastname" of a user, if known.
    fn display_name(&self, user_id: Uuid) -> Option<String>;

    fn user_exists(&self, user_id: Uuid) -> bool {
        self.display_name(user_id).is_some()
    }
}

/// A known user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }
}

/// In-memory users and roles.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    roles: HashMap<String, Capabilities>,
    users: HashMap<Uuid, UserProfile>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: impl Into<String>, capabilities: Capabilities) -> Self {
        self.roles.insert(role.into(), capabilities);
        self
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.users.insert(user.id, user);
        self
    }

    /// Register a user and return its id.
    pub fn add_user(
        &mut self,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        role: impl Into<String>,
    ) -> Uuid {
        let user = UserProfile {
            id: Uuid::new_v4(),
            firstname: firstname.into(),
            lastname: lastname.into(),
            role: role.into(),
        };
        let id = user.id;
        self.users.insert(id, user);
        id
    }

    pub fn user(&self, user_id: Uuid) -> Option<&UserProfile> {
        self.users.get(&user_id)
    }
}

impl CapabilityProvider for Directory {
    fn capabilities(&self, role: &str) -> Option<Capabilities> {
        self.roles.get(role).copied()
    }
}

impl IdentityProvider for Directory {
    fn resolve(&self, user_id: Uuid) -> Option<Caller> {
        let user = self.users.get(&user_id)?;
        // Unknown roles resolve with no capabilities rather than failing.
        let capabilities = self.capabilities(&user.role).unwrap_or_default();
        Some(Caller::new(user.id, user.role.clone(), capabilities))
    }

    fn display_name(&self, user_id: Uuid) -> Option<String> {
        self.users.get(&user_id).map(UserProfile::display_name)
    }
}
