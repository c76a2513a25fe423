use crate::models::{datetime_to_timestamp, timestamp_to_datetime, Interaction, Like};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

const LIKE_COLUMNS: &str = "id, user_id, review_id, created_at";

pub struct LikeRepository;

impl LikeRepository {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Like> {
        Ok(Like {
            id: row.get(0)?,
            interaction: Interaction {
                user_id: row.get(1)?,
                created_at: timestamp_to_datetime(row.get(3)?),
            },
            review_id: row.get(2)?,
        })
    }

    /// Record a like and return its id
    pub fn create(conn: &Connection, interaction: &Interaction, review_id: i64) -> Result<i64> {
        conn.execute(
            "INSERT INTO likes (user_id, review_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                interaction.user_id,
                review_id,
                datetime_to_timestamp(&interaction.created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Find a user's like on a review
    pub fn find(conn: &Connection, user_id: i64, review_id: i64) -> Result<Option<Like>> {
        let sql = format!("SELECT {} FROM likes WHERE user_id = ?1 AND review_id = ?2", LIKE_COLUMNS);
        Ok(conn.query_row(&sql, params![user_id, review_id], Self::from_row).optional()?)
    }

    /// Likes given by a user, newest first
    pub fn get_by_user(conn: &Connection, user_id: i64) -> Result<Vec<Like>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM likes WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            LIKE_COLUMNS
        ))?;

        let likes = stmt
            .query_map(params![user_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(likes)
    }

    pub fn count_for_review(conn: &Connection, review_id: i64) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE review_id = ?1",
            params![review_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let rows_affected = conn.execute("DELETE FROM likes WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Like not found: {}", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewContent, Target, TargetKind, User};
    use crate::storage::{ContentRepository, Database, ReviewRepository, UserRepository};
    use tempfile::tempdir;

    fn setup_test_db() -> (tempfile::TempDir, Connection, i64) {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db"));
        let conn = db.create().unwrap();
        UserRepository::upsert(&conn, &User::new(1, "alice".to_string())).unwrap();
        let comic = ContentRepository::create(&conn, TargetKind::Comic, &NewContent::new("Dorohedoro", "Hayashida", "manga"))
            .unwrap();
        let review = ReviewRepository::create(&conn, 1, Target::Comic(comic), "Weird and good", 8.0).unwrap();
        (dir, conn, review)
    }

    #[test]
    fn test_like_roundtrip() {
        let (_dir, conn, review) = setup_test_db();
        let id = LikeRepository::create(&conn, &Interaction::new(1), review).unwrap();

        let like = LikeRepository::find(&conn, 1, review).unwrap().unwrap();
        assert_eq!(like.id, id);
        assert_eq!(LikeRepository::count_for_review(&conn, review).unwrap(), 1);

        LikeRepository::delete(&conn, id).unwrap();
        assert!(LikeRepository::find(&conn, 1, review).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_like_is_constraint_violation() {
        let (_dir, conn, review) = setup_test_db();
        LikeRepository::create(&conn, &Interaction::new(1), review).unwrap();

        let err = LikeRepository::create(&conn, &Interaction::new(1), review).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_likes_removed_with_review() {
        let (_dir, conn, review) = setup_test_db();
        LikeRepository::create(&conn, &Interaction::new(1), review).unwrap();

        ReviewRepository::delete(&conn, review).unwrap();
        assert!(LikeRepository::get_by_user(&conn, 1).unwrap().is_empty());
    }
}
