use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Media type a favorite, review or library entry points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Comic,
    Novel,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::Comic, TargetKind::Novel];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "comic" => Some(TargetKind::Comic),
            "novel" => Some(TargetKind::Novel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Comic => "comic",
            TargetKind::Novel => "novel",
        }
    }

    /// Catalog table holding this kind of content.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            TargetKind::Comic => "comics",
            TargetKind::Novel => "novels",
        }
    }

    /// Column referencing this kind of content from favorites, reviews and library entries.
    pub(crate) fn column(&self) -> &'static str {
        match self {
            TargetKind::Comic => "comic_id",
            TargetKind::Novel => "novel_id",
        }
    }

    pub(crate) fn genre_table(&self) -> &'static str {
        match self {
            TargetKind::Comic => "comic_genres",
            TargetKind::Novel => "novel_genres",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusive reference to a comic or a novel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Comic(i64),
    Novel(i64),
}

impl Target {
    pub fn new(kind: TargetKind, id: i64) -> Self {
        match kind {
            TargetKind::Comic => Target::Comic(id),
            TargetKind::Novel => Target::Novel(id),
        }
    }

    /// Build a target from the nullable comic/novel pair used on the wire and in the schema.
    pub fn from_parts(comic: Option<i64>, novel: Option<i64>) -> Result<Self> {
        match (comic, novel) {
            (Some(id), None) => Ok(Target::Comic(id)),
            (None, Some(id)) => Ok(Target::Novel(id)),
            (None, None) => Err(Error::Validation(
                "must target either a comic or a novel".to_string(),
            )),
            (Some(_), Some(_)) => Err(Error::Validation(
                "cannot target both a comic and a novel".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Comic(_) => TargetKind::Comic,
            Target::Novel(_) => TargetKind::Novel,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Target::Comic(id) | Target::Novel(id) => *id,
        }
    }

    pub fn comic_id(&self) -> Option<i64> {
        match self {
            Target::Comic(id) => Some(*id),
            Target::Novel(_) => None,
        }
    }

    pub fn novel_id(&self) -> Option<i64> {
        match self {
            Target::Novel(id) => Some(*id),
            Target::Comic(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Result of a catalog existence lookup.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TargetRef {
    pub id: i64,
    pub exists: bool,
}
