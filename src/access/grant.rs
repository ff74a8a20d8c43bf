//! # Access Grants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission for one user to read one private file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn new(file_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}
