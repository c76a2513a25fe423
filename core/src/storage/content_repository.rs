use crate::models::{
    datetime_to_timestamp, now, timestamp_to_datetime, Content, ContentFilter, ContentStatus, Genre,
    NewContent, Target, TargetKind, TargetRef,
};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CONTENT_COLUMNS: &str = "c.id, c.title, c.author, c.format, c.status, c.release_year, \
     c.description, c.average_rating, c.total_chapters, c.total_volumes, c.updated_at";

/// Minimum average rating for anonymous / cold-start recommendations.
const TOP_RATED_THRESHOLD: f64 = 8.0;
/// Minimum average rating for genre-matched recommendations.
const GENRE_MATCH_THRESHOLD: f64 = 7.0;
const RECOMMENDATION_LIMIT: i64 = 10;

pub struct ContentRepository;

impl ContentRepository {
    fn from_row(kind: TargetKind, row: &Row<'_>) -> rusqlite::Result<Content> {
        Ok(Content {
            id: row.get(0)?,
            kind,
            title: row.get(1)?,
            author: row.get(2)?,
            format: row.get(3)?,
            status: ContentStatus::from_str(&row.get::<_, String>(4)?)
                .ok_or(rusqlite::Error::InvalidQuery)?,
            release_year: row.get(5)?,
            description: row.get(6)?,
            average_rating: row.get(7)?,
            total_chapters: row.get(8)?,
            total_volumes: row.get(9)?,
            genres: Vec::new(),
            updated_at: timestamp_to_datetime(row.get(10)?),
        })
    }

    fn load_genres(conn: &Connection, kind: TargetKind, content: &mut Content) -> Result<()> {
        let mut stmt = conn.prepare(&format!(
            "SELECT g.name FROM genres g JOIN {} x ON x.genre_id = g.id WHERE x.{} = ?1 ORDER BY g.name",
            kind.genre_table(),
            kind.column()
        ))?;
        content.genres = stmt
            .query_map(params![content.id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(())
    }

    fn collect(conn: &Connection, kind: TargetKind, mut items: Vec<Content>) -> Result<Vec<Content>> {
        for item in items.iter_mut() {
            Self::load_genres(conn, kind, item)?;
        }
        Ok(items)
    }

    /// Create a comic or novel, linking (and creating) its genres
    pub fn create(conn: &Connection, kind: TargetKind, content: &NewContent) -> Result<i64> {
        content.validate(kind)?;

        conn.execute(
            &format!(
                "INSERT INTO {} (title, author, format, status, release_year, description,
                 total_chapters, total_volumes, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                kind.table()
            ),
            params![
                content.title.trim(),
                content.author.trim(),
                content.format,
                content.status.as_str(),
                content.release_year,
                content.description,
                content.total_chapters,
                content.total_volumes,
                datetime_to_timestamp(&now()),
            ],
        )?;
        let id = conn.last_insert_rowid();

        for name in &content.genres {
            let genre = Self::get_or_create_genre(conn, name)?;
            conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} ({}, genre_id) VALUES (?1, ?2)",
                    kind.genre_table(),
                    kind.column()
                ),
                params![id, genre.id],
            )?;
        }

        Ok(id)
    }

    /// Get a comic or novel by ID
    pub fn get_by_id(conn: &Connection, kind: TargetKind, id: i64) -> Result<Content> {
        let sql = format!("SELECT {} FROM {} c WHERE c.id = ?1", CONTENT_COLUMNS, kind.table());
        let mut content = conn
            .query_row(&sql, params![id], |row| Self::from_row(kind, row))
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("{} not found: {}", kind, id)))?;
        Self::load_genres(conn, kind, &mut content)?;
        Ok(content)
    }

    /// Existence lookup used by the favorites store and other collaborators
    pub fn get_target(conn: &Connection, kind: TargetKind, id: i64) -> Result<TargetRef> {
        let exists: bool = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", kind.table()),
            params![id],
            |row| row.get(0),
        )?;
        Ok(TargetRef { id, exists })
    }

    /// Fail with `NotFound` unless the target exists
    pub fn ensure_exists(conn: &Connection, target: Target) -> Result<()> {
        if Self::get_target(conn, target.kind(), target.id())?.exists {
            Ok(())
        } else {
            Err(Error::NotFound(format!("{} not found: {}", target.kind(), target.id())))
        }
    }

    /// Chapter count of a target, used by library progress validation
    pub fn get_total_chapters(conn: &Connection, target: Target) -> Result<i64> {
        conn.query_row(
            &format!("SELECT total_chapters FROM {} WHERE id = ?1", target.kind().table()),
            params![target.id()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("{} not found: {}", target.kind(), target.id())))
    }

    /// List content ordered by popularity (rating weighted by review count), then recency
    pub fn list(conn: &Connection, kind: TargetKind, filter: &ContentFilter) -> Result<Vec<Content>> {
        let column = kind.column();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM {table} c
             WHERE (?1 IS NULL OR c.format = ?1)
               AND (?2 IS NULL OR c.status = lower(?2))
               AND (?3 IS NULL OR c.release_year = ?3)
               AND (?4 IS NULL OR EXISTS (
                    SELECT 1 FROM {genres} x JOIN genres g ON g.id = x.genre_id
                    WHERE x.{column} = c.id AND g.name = ?4))
             ORDER BY c.average_rating * ((SELECT COUNT(*) FROM reviews r WHERE r.{column} = c.id) + 1) DESC,
                      c.updated_at DESC, c.id DESC",
            cols = CONTENT_COLUMNS,
            table = kind.table(),
            genres = kind.genre_table(),
            column = column,
        ))?;

        let items = stmt
            .query_map(
                params![filter.format, filter.status, filter.release_year, filter.genre],
                |row| Self::from_row(kind, row),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Self::collect(conn, kind, items)
    }

    /// Delete a comic or novel row. Dependent rows go through `ON DELETE CASCADE`.
    pub fn delete(conn: &Connection, kind: TargetKind, id: i64) -> Result<()> {
        let rows_affected = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
            params![id],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("{} not found: {}", kind, id)));
        }

        Ok(())
    }

    /// Recompute a target's average rating from its reviews (0.0 without reviews)
    pub fn refresh_average_rating(conn: &Connection, target: Target) -> Result<f64> {
        let kind = target.kind();
        conn.execute(
            &format!(
                "UPDATE {} SET average_rating =
                    COALESCE((SELECT ROUND(AVG(rating), 1) FROM reviews WHERE {} = ?1), 0.0)
                 WHERE id = ?1",
                kind.table(),
                kind.column()
            ),
            params![target.id()],
        )?;

        let rating: f64 = conn.query_row(
            &format!("SELECT average_rating FROM {} WHERE id = ?1", kind.table()),
            params![target.id()],
            |row| row.get(0),
        )?;
        Ok(rating)
    }

    /// Count catalog rows of one kind
    pub fn count(conn: &Connection, kind: TargetKind) -> Result<i64> {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Top rated titles, or genre matches from the user's library when it has any
    pub fn recommendations(conn: &Connection, kind: TargetKind, user_id: Option<i64>) -> Result<Vec<Content>> {
        let table = kind.table();
        let genres = kind.genre_table();
        let column = kind.column();

        if let Some(user_id) = user_id {
            let has_genres: bool = conn.query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {genres} x JOIN library_entries le ON le.{column} = x.{column}
                     WHERE le.user_id = ?1)"
                ),
                params![user_id],
                |row| row.get(0),
            )?;

            if has_genres {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {cols} FROM {table} c
                     WHERE c.average_rating >= ?2
                       AND EXISTS (
                           SELECT 1 FROM {genres} x
                           WHERE x.{column} = c.id AND x.genre_id IN (
                               SELECT x2.genre_id FROM {genres} x2
                               JOIN library_entries le ON le.{column} = x2.{column}
                               WHERE le.user_id = ?1))
                       AND NOT EXISTS (
                           SELECT 1 FROM library_entries le WHERE le.user_id = ?1 AND le.{column} = c.id)
                     ORDER BY c.average_rating DESC, c.id
                     LIMIT ?3",
                    cols = CONTENT_COLUMNS
                ))?;
                let items = stmt
                    .query_map(
                        params![user_id, GENRE_MATCH_THRESHOLD, RECOMMENDATION_LIMIT],
                        |row| Self::from_row(kind, row),
                    )?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                return Self::collect(conn, kind, items);
            }
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} c WHERE c.average_rating >= ?1 ORDER BY c.average_rating DESC, c.id LIMIT ?2",
            CONTENT_COLUMNS, table
        ))?;
        let items = stmt
            .query_map(params![TOP_RATED_THRESHOLD, RECOMMENDATION_LIMIT], |row| {
                Self::from_row(kind, row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::collect(conn, kind, items)
    }

    /// Create a genre; names are unique regardless of case
    pub fn create_genre(conn: &Connection, name: &str) -> Result<Genre> {
        let name = name.trim();
        if name.is_empty() || name.len() > 50 {
            return Err(Error::Validation("genre name must be 1-50 characters".to_string()));
        }
        if Self::get_genre_by_name(conn, name)?.is_some() {
            return Err(Error::Conflict(format!("genre already exists: {}", name)));
        }

        conn.execute("INSERT INTO genres (name) VALUES (?1)", params![name])?;
        Ok(Genre {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// Get a genre by name (case-insensitive)
    pub fn get_genre_by_name(conn: &Connection, name: &str) -> Result<Option<Genre>> {
        Ok(conn
            .query_row(
                "SELECT id, name FROM genres WHERE name = ?1",
                params![name.trim()],
                |row| Ok(Genre { id: row.get(0)?, name: row.get(1)? }),
            )
            .optional()?)
    }

    /// Get or create a genre by name
    pub fn get_or_create_genre(conn: &Connection, name: &str) -> Result<Genre> {
        match Self::get_genre_by_name(conn, name)? {
            Some(genre) => Ok(genre),
            None => Self::create_genre(conn, name),
        }
    }

    /// Get all genres
    pub fn list_genres(conn: &Connection) -> Result<Vec<Genre>> {
        let mut stmt = conn.prepare("SELECT id, name FROM genres ORDER BY name")?;

        let genres = stmt
            .query_map([], |row| Ok(Genre { id: row.get(0)?, name: row.get(1)? }))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(genres)
    }

    pub fn count_genres(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM genres", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use tempfile::tempdir;

    fn setup_test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db"));
        let conn = db.create().unwrap();
        (dir, conn)
    }

    fn with_genres(title: &str, format: &str, genres: &[&str]) -> NewContent {
        let mut content = NewContent::new(title, "Author", format);
        content.genres = genres.iter().map(|g| g.to_string()).collect();
        content
    }

    fn set_rating(conn: &Connection, kind: TargetKind, id: i64, rating: f64) {
        conn.execute(
            &format!("UPDATE {} SET average_rating = ?1 WHERE id = ?2", kind.table()),
            params![rating, id],
        )
        .unwrap();
    }

    #[test]
    fn test_create_and_get_with_genres() {
        let (_dir, conn) = setup_test_db();
        let id = ContentRepository::create(
            &conn,
            TargetKind::Comic,
            &with_genres("Berserk", "manga", &["Fantasy", "Action"]),
        )
        .unwrap();

        let comic = ContentRepository::get_by_id(&conn, TargetKind::Comic, id).unwrap();
        assert_eq!(comic.title, "Berserk");
        assert_eq!(comic.genres, vec!["Action".to_string(), "Fantasy".to_string()]);
        assert_eq!(comic.average_rating, 0.0);
        assert_eq!(ContentRepository::count_genres(&conn).unwrap(), 2);
    }

    #[test]
    fn test_get_target() {
        let (_dir, conn) = setup_test_db();
        let id = ContentRepository::create(&conn, TargetKind::Novel, &NewContent::new("Overlord", "M", "light novel"))
            .unwrap();

        assert!(ContentRepository::get_target(&conn, TargetKind::Novel, id).unwrap().exists);
        assert!(!ContentRepository::get_target(&conn, TargetKind::Comic, id).unwrap().exists);
        assert!(matches!(
            ContentRepository::ensure_exists(&conn, Target::Novel(id + 1)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_list_filters() {
        let (_dir, conn) = setup_test_db();
        ContentRepository::create(&conn, TargetKind::Comic, &with_genres("A", "manga", &["Horror"])).unwrap();
        ContentRepository::create(&conn, TargetKind::Comic, &with_genres("B", "manhwa", &["Romance"])).unwrap();

        let filter = ContentFilter {
            genre: Some("horror".to_string()),
            ..ContentFilter::default()
        };
        let horror = ContentRepository::list(&conn, TargetKind::Comic, &filter).unwrap();
        assert_eq!(horror.len(), 1);
        assert_eq!(horror[0].title, "A");

        let filter = ContentFilter {
            format: Some("manhwa".to_string()),
            ..ContentFilter::default()
        };
        assert_eq!(ContentRepository::list(&conn, TargetKind::Comic, &filter).unwrap()[0].title, "B");
    }

    #[test]
    fn test_list_orders_by_popularity() {
        let (_dir, conn) = setup_test_db();
        let low = ContentRepository::create(&conn, TargetKind::Comic, &NewContent::new("Low", "A", "comic")).unwrap();
        let high = ContentRepository::create(&conn, TargetKind::Comic, &NewContent::new("High", "A", "comic")).unwrap();
        set_rating(&conn, TargetKind::Comic, low, 3.0);
        set_rating(&conn, TargetKind::Comic, high, 9.0);

        let all = ContentRepository::list(&conn, TargetKind::Comic, &ContentFilter::default()).unwrap();
        assert_eq!(all[0].id, high);
    }

    #[test]
    fn test_create_genre_conflict() {
        let (_dir, conn) = setup_test_db();
        ContentRepository::create_genre(&conn, "Isekai").unwrap();

        assert!(matches!(
            ContentRepository::create_genre(&conn, "ISEKAI"),
            Err(Error::Conflict(_))
        ));
        assert_eq!(ContentRepository::list_genres(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_recommendations_anonymous_threshold() {
        let (_dir, conn) = setup_test_db();
        let good = ContentRepository::create(&conn, TargetKind::Novel, &NewContent::new("Good", "A", "novel")).unwrap();
        let meh = ContentRepository::create(&conn, TargetKind::Novel, &NewContent::new("Meh", "A", "novel")).unwrap();
        set_rating(&conn, TargetKind::Novel, good, 8.5);
        set_rating(&conn, TargetKind::Novel, meh, 7.5);

        let picks = ContentRepository::recommendations(&conn, TargetKind::Novel, None).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].id, good);
    }

    #[test]
    fn test_delete_missing() {
        let (_dir, conn) = setup_test_db();
        assert!(matches!(
            ContentRepository::delete(&conn, TargetKind::Comic, 99),
            Err(Error::NotFound(_))
        ));
    }
}
