use crate::models::{datetime_to_timestamp, now, timestamp_to_datetime, Review, ReviewFilter, Target};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::target_from_row;

// `?1` is always the viewer id (NULL for anonymous) feeding `is_liked`.
const REVIEW_SELECT: &str = "SELECT r.id, r.user_id, u.username, r.comic_id, r.novel_id, r.content, r.rating,
            r.created_at,
            (SELECT COUNT(*) FROM likes l WHERE l.review_id = r.id),
            EXISTS(SELECT 1 FROM likes l WHERE l.review_id = r.id AND l.user_id = ?1)
     FROM reviews r JOIN users u ON u.id = r.user_id";

pub struct ReviewRepository;

impl ReviewRepository {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
        Ok(Review {
            id: row.get(0)?,
            user_id: row.get(1)?,
            username: row.get(2)?,
            target: target_from_row(row, 3, 4)?,
            content: row.get(5)?,
            rating: row.get(6)?,
            created_at: timestamp_to_datetime(row.get(7)?),
            likes_count: row.get(8)?,
            is_liked: row.get(9)?,
        })
    }

    /// Insert a review and return its id
    pub fn create(conn: &Connection, user_id: i64, target: Target, content: &str, rating: f64) -> Result<i64> {
        conn.execute(
            "INSERT INTO reviews (user_id, comic_id, novel_id, content, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                target.comic_id(),
                target.novel_id(),
                content,
                rating,
                datetime_to_timestamp(&now()),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a review by ID as seen by `viewer`
    pub fn get_by_id(conn: &Connection, id: i64, viewer: Option<i64>) -> Result<Review> {
        let sql = format!("{} WHERE r.id = ?2", REVIEW_SELECT);
        conn.query_row(&sql, params![viewer, id], Self::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Review not found: {}", id)))
    }

    /// Whether a user already reviewed a target
    pub fn exists_for_target(conn: &Connection, user_id: i64, target: Target) -> Result<bool> {
        let exists: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = ?1 AND {} = ?2)",
                target.kind().column()
            ),
            params![user_id, target.id()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List reviews newest first
    pub fn list(conn: &Connection, filter: &ReviewFilter, viewer: Option<i64>) -> Result<Vec<Review>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE (?2 IS NULL OR r.comic_id = ?2)
               AND (?3 IS NULL OR r.novel_id = ?3)
               AND (?4 IS NULL OR u.username = ?4)
             ORDER BY r.created_at DESC, r.id DESC",
            REVIEW_SELECT
        ))?;

        let reviews = stmt
            .query_map(
                params![viewer, filter.comic, filter.novel, filter.username],
                Self::from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reviews)
    }

    /// Overwrite content and rating
    pub fn update(conn: &Connection, id: i64, content: &str, rating: f64) -> Result<()> {
        let rows_affected = conn.execute(
            "UPDATE reviews SET content = ?1, rating = ?2 WHERE id = ?3",
            params![content, rating, id],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Review not found: {}", id)));
        }

        Ok(())
    }

    /// Delete a review (its likes go with it)
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let rows_affected = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Review not found: {}", id)));
        }

        Ok(())
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
        Ok(count)
    }
}
