use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Target, TargetKind};
use crate::{Error, Result};

const COMIC_FORMATS: [&str; 5] = ["manga", "manhwa", "manhua", "webtoon", "comic"];
const NOVEL_FORMATS: [&str; 3] = ["light novel", "web novel", "novel"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Ongoing,
    Completed,
    Hiatus,
}

impl ContentStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ongoing" => Some(ContentStatus::Ongoing),
            "completed" => Some(ContentStatus::Completed),
            "hiatus" => Some(ContentStatus::Hiatus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Ongoing => "ongoing",
            ContentStatus::Completed => "completed",
            ContentStatus::Hiatus => "hiatus",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A comic or a novel in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub id: i64,
    pub kind: TargetKind,
    pub title: String,
    pub author: String,
    /// `comic_type` for comics, `novel_type` for novels.
    pub format: String,
    pub status: ContentStatus,
    pub release_year: Option<i64>,
    pub description: String,
    pub average_rating: f64,
    pub total_chapters: i64,
    pub total_volumes: i64,
    pub genres: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn target(&self) -> Target {
        Target::new(self.kind, self.id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContent {
    pub title: String,
    pub author: String,
    pub format: String,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub release_year: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_chapters: i64,
    #[serde(default)]
    pub total_volumes: i64,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl NewContent {
    pub fn new(title: &str, author: &str, format: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            format: format.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self, kind: TargetKind) -> Result<()> {
        if self.title.trim().is_empty() || self.title.len() > 200 {
            return Err(Error::Validation("title must be 1-200 characters".to_string()));
        }
        if self.author.trim().is_empty() || self.author.len() > 100 {
            return Err(Error::Validation("author must be 1-100 characters".to_string()));
        }
        let formats: &[&str] = match kind {
            TargetKind::Comic => &COMIC_FORMATS,
            TargetKind::Novel => &NOVEL_FORMATS,
        };
        if !formats.contains(&self.format.as_str()) {
            return Err(Error::Validation(format!(
                "invalid {} type '{}', expected one of: {}",
                kind,
                self.format,
                formats.join(", ")
            )));
        }
        if self.total_chapters < 0 || self.total_volumes < 0 {
            return Err(Error::Validation("chapter and volume counts cannot be negative".to_string()));
        }
        Ok(())
    }
}

/// Simple catalog listing filters; all comparisons are exact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentFilter {
    pub format: Option<String>,
    pub status: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i64>,
}
