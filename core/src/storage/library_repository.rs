use crate::models::{
    datetime_to_timestamp, timestamp_to_datetime, LibraryEntry, LibraryFilter, ReadingStatus, Target,
};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::target_from_row;

const LIBRARY_SELECT: &str = "SELECT le.id, le.user_id, le.comic_id, le.novel_id, le.status, le.progress,
            le.started_at, le.completed_at, le.created_at, le.updated_at,
            COALESCE(c.total_chapters, n.total_chapters, 0)
     FROM library_entries le
     LEFT JOIN comics c ON c.id = le.comic_id
     LEFT JOIN novels n ON n.id = le.novel_id";

pub struct LibraryRepository;

impl LibraryRepository {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<LibraryEntry> {
        let started_at: Option<i64> = row.get(6)?;
        let completed_at: Option<i64> = row.get(7)?;

        let mut entry = LibraryEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            target: target_from_row(row, 2, 3)?,
            status: ReadingStatus::from_str(&row.get::<_, String>(4)?)
                .ok_or(rusqlite::Error::InvalidQuery)?,
            progress: row.get(5)?,
            total_chapters: row.get(10)?,
            started_at: started_at.map(timestamp_to_datetime),
            completed_at: completed_at.map(timestamp_to_datetime),
            created_at: timestamp_to_datetime(row.get(8)?),
            updated_at: timestamp_to_datetime(row.get(9)?),
        };
        entry.cap_progress();
        Ok(entry)
    }

    /// Insert a library entry and return its id
    pub fn create(conn: &Connection, entry: &LibraryEntry) -> Result<i64> {
        conn.execute(
            "INSERT INTO library_entries
                (user_id, comic_id, novel_id, status, progress, started_at, completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.user_id,
                entry.target.comic_id(),
                entry.target.novel_id(),
                entry.status.as_str(),
                entry.progress,
                entry.started_at.as_ref().map(datetime_to_timestamp),
                entry.completed_at.as_ref().map(datetime_to_timestamp),
                datetime_to_timestamp(&entry.created_at),
                datetime_to_timestamp(&entry.updated_at),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a library entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<LibraryEntry> {
        let sql = format!("{} WHERE le.id = ?1", LIBRARY_SELECT);
        conn.query_row(&sql, params![id], Self::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Library entry not found: {}", id)))
    }

    /// Find a user's entry for a target
    pub fn find_by_target(conn: &Connection, user_id: i64, target: Target) -> Result<Option<LibraryEntry>> {
        let sql = format!(
            "{} WHERE le.user_id = ?1 AND le.{} = ?2",
            LIBRARY_SELECT,
            target.kind().column()
        );
        Ok(conn.query_row(&sql, params![user_id, target.id()], Self::from_row).optional()?)
    }

    /// Persist status, progress and timestamps of an existing entry
    pub fn update(conn: &Connection, entry: &LibraryEntry) -> Result<()> {
        let rows_affected = conn.execute(
            "UPDATE library_entries
             SET status = ?1, progress = ?2, started_at = ?3, completed_at = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                entry.status.as_str(),
                entry.progress,
                entry.started_at.as_ref().map(datetime_to_timestamp),
                entry.completed_at.as_ref().map(datetime_to_timestamp),
                datetime_to_timestamp(&entry.updated_at),
                entry.id,
            ],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Library entry not found: {}", entry.id)));
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let rows_affected = conn.execute("DELETE FROM library_entries WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Library entry not found: {}", id)));
        }

        Ok(())
    }

    /// A user's entries, most recently updated first.
    ///
    /// `media_type` narrows to `comic` or `novel`; any other value lists both.
    pub fn list(conn: &Connection, user_id: i64, filter: &LibraryFilter) -> Result<Vec<LibraryEntry>> {
        let media_type = filter
            .media_type
            .as_deref()
            .map(str::to_lowercase)
            .filter(|m| m == "comic" || m == "novel");

        let mut stmt = conn.prepare(&format!(
            "{} WHERE le.user_id = ?1
               AND (?2 IS NULL OR le.status = ?2)
               AND (?3 IS NULL
                    OR (?3 = 'comic' AND le.comic_id IS NOT NULL)
                    OR (?3 = 'novel' AND le.novel_id IS NOT NULL))
             ORDER BY le.updated_at DESC, le.id DESC",
            LIBRARY_SELECT
        ))?;

        let entries = stmt
            .query_map(params![user_id, filter.status, media_type], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Number of entries in a user's library
    pub fn count_for_user(conn: &Connection, user_id: i64) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM library_entries WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
