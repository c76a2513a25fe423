use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields every user interaction (favorite, like) carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            created_at: super::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}
