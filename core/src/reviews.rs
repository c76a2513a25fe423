use serde::{Deserialize, Serialize};

use crate::models::{Interaction, Like, Review, ReviewFilter, Target};
use crate::storage::{ContentRepository, Database, LikeRepository, ReviewRepository};
use crate::{write_transaction, Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    #[serde(default)]
    pub comic: Option<i64>,
    #[serde(default)]
    pub novel: Option<i64>,
    pub content: String,
    pub rating: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewUpdate {
    pub content: Option<String>,
    pub rating: Option<f64>,
}

/// Outcome of liking or unliking a review.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}

/// Reviews and review likes. Every review change refreshes the average
/// rating of its target in the same transaction.
#[derive(Debug, Clone)]
pub struct ReviewStore {
    db: Database,
}

impl ReviewStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create(&self, user_id: i64, review: &NewReview) -> Result<Review> {
        let target = Target::from_parts(review.comic, review.novel)?;
        Review::validate_content(&review.content)?;
        let rating = Review::validate_rating(review.rating)?;

        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;
        ContentRepository::ensure_exists(&tx, target)?;
        if ReviewRepository::exists_for_target(&tx, user_id, target)? {
            return Err(Error::Conflict(format!("you already reviewed {}", target)));
        }

        let id = ReviewRepository::create(&tx, user_id, target, review.content.trim(), rating)?;
        let average = ContentRepository::refresh_average_rating(&tx, target)?;
        let created = ReviewRepository::get_by_id(&tx, id, Some(user_id))?;
        tx.commit()?;

        tracing::info!(review_id = id, %target, average, "review created");
        Ok(created)
    }

    pub fn update(&self, actor: i64, review_id: i64, update: &ReviewUpdate) -> Result<Review> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        let existing = ReviewRepository::get_by_id(&tx, review_id, Some(actor))?;
        if existing.user_id != actor {
            return Err(Error::PermissionDenied("you can only edit your own reviews".to_string()));
        }

        let content = match &update.content {
            Some(content) => {
                Review::validate_content(content)?;
                content.trim().to_string()
            }
            None => existing.content,
        };
        let rating = match update.rating {
            Some(rating) => Review::validate_rating(rating)?,
            None => existing.rating,
        };

        ReviewRepository::update(&tx, review_id, &content, rating)?;
        ContentRepository::refresh_average_rating(&tx, existing.target)?;
        let updated = ReviewRepository::get_by_id(&tx, review_id, Some(actor))?;
        tx.commit()?;

        Ok(updated)
    }

    pub fn delete(&self, actor: i64, review_id: i64) -> Result<()> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        let existing = ReviewRepository::get_by_id(&tx, review_id, None)?;
        if existing.user_id != actor {
            return Err(Error::PermissionDenied("you can only delete your own reviews".to_string()));
        }

        ReviewRepository::delete(&tx, review_id)?;
        ContentRepository::refresh_average_rating(&tx, existing.target)?;
        tx.commit()?;

        tracing::info!(review_id, target = %existing.target, "review deleted");
        Ok(())
    }

    pub fn get(&self, review_id: i64, viewer: Option<i64>) -> Result<Review> {
        let conn = self.db.connect()?;
        ReviewRepository::get_by_id(&conn, review_id, viewer)
    }

    /// Reviews newest first, with like state for `viewer`
    pub fn list(&self, filter: &ReviewFilter, viewer: Option<i64>) -> Result<Vec<Review>> {
        let conn = self.db.connect()?;
        ReviewRepository::list(&conn, filter, viewer)
    }

    /// Like a review, or remove the like if the user already gave one.
    pub fn toggle_like(&self, user_id: i64, review_id: i64) -> Result<LikeToggle> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        ReviewRepository::get_by_id(&tx, review_id, None)?;
        let liked = match LikeRepository::find(&tx, user_id, review_id)? {
            Some(like) => {
                LikeRepository::delete(&tx, like.id)?;
                false
            }
            None => {
                LikeRepository::create(&tx, &Interaction::new(user_id), review_id)?;
                true
            }
        };
        let likes_count = LikeRepository::count_for_review(&tx, review_id)?;
        tx.commit()?;

        tracing::debug!(user_id, review_id, liked, likes_count, "like toggled");
        Ok(LikeToggle { liked, likes_count })
    }

    /// Likes given by a user, newest first
    pub fn list_likes(&self, user_id: i64) -> Result<Vec<Like>> {
        let conn = self.db.connect()?;
        LikeRepository::get_by_user(&conn, user_id)
    }
}
