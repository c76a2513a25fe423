use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ContentStatus, Interaction, Target, TargetKind};

/// A ranked favorite. Ranks are dense `1..N` within the owner's partition for the target kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub id: i64,
    #[serde(flatten)]
    pub interaction: Interaction,
    pub target: Target,
    pub rank: i64,
}

impl Favorite {
    pub fn owner(&self) -> i64 {
        self.interaction.user_id
    }

    pub fn partition(&self) -> Partition {
        Partition::new(self.owner(), self.target.kind())
    }
}

/// Display fields of the comic or novel a favorite points at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetDetail {
    pub title: String,
    pub author: String,
    pub status: ContentStatus,
    pub average_rating: f64,
}

/// A favorite joined with its target, the shape favorite listings return.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FavoriteDetail {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub target_type: TargetKind,
    pub target_id: i64,
    pub target_detail: TargetDetail,
}

impl FavoriteDetail {
    pub fn new(favorite: Favorite, target_detail: TargetDetail) -> Self {
        Self {
            target_type: favorite.target.kind(),
            target_id: favorite.target.id(),
            favorite,
            target_detail,
        }
    }
}

/// Scope within which favorite ranks are unique and gapless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    pub owner: i64,
    pub kind: TargetKind,
}

impl Partition {
    pub fn new(owner: i64, kind: TargetKind) -> Self {
        Self { owner, kind }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}/{}", self.owner, self.kind)
    }
}

/// Request to favorite a comic or novel, optionally at a given rank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFavorite {
    #[serde(default)]
    pub comic: Option<i64>,
    #[serde(default)]
    pub novel: Option<i64>,
    #[serde(default)]
    pub rank: Option<i64>,
}

impl NewFavorite {
    pub fn comic(id: i64) -> Self {
        Self {
            comic: Some(id),
            ..Self::default()
        }
    }

    pub fn novel(id: i64) -> Self {
        Self {
            novel: Some(id),
            ..Self::default()
        }
    }

    pub fn at_rank(mut self, rank: i64) -> Self {
        self.rank = Some(rank);
        self
    }
}

/// One `(favorite id, rank)` pair of a bulk reorder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankAssignment {
    pub id: i64,
    pub rank: i64,
}
