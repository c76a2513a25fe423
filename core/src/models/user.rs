use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity row mirrored from the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: i64, username: String) -> Self {
        Self {
            id,
            username,
            created_at: super::now(),
        }
    }
}
