use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Target;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub target: Target,
    pub content: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    /// Whether the viewing user liked this review; false for anonymous viewers.
    pub is_liked: bool,
}

impl Review {
    pub fn validate_rating(rating: f64) -> Result<f64> {
        if !(0.0..=10.0).contains(&rating) {
            return Err(Error::Validation("rating must be between 0.0 and 10.0".to_string()));
        }
        Ok((rating * 10.0).round() / 10.0)
    }

    pub fn validate_content(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(Error::Validation("review content cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewFilter {
    pub comic: Option<i64>,
    pub novel: Option<i64>,
    pub username: Option<String>,
}
