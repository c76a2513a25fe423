use crate::models::{
    datetime_to_timestamp, timestamp_to_datetime, ContentStatus, Favorite, FavoriteDetail,
    Interaction, Partition, Target, TargetDetail, TargetKind,
};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::target_from_row;

const FAVORITE_COLUMNS: &str = "id, user_id, comic_id, novel_id, rank, created_at";

/// Rank a favorite is parked at while its neighbours shift around it.
pub const PARKED_RANK: i64 = 0;

pub struct FavoriteRepository;

impl FavoriteRepository {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Favorite> {
        Ok(Favorite {
            id: row.get(0)?,
            interaction: Interaction {
                user_id: row.get(1)?,
                created_at: timestamp_to_datetime(row.get(5)?),
            },
            target: target_from_row(row, 2, 3)?,
            rank: row.get(4)?,
        })
    }

    /// Insert a favorite at the given rank and return its id
    pub fn create(
        conn: &Connection,
        interaction: &Interaction,
        target: Target,
        rank: i64,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO favorites (user_id, comic_id, novel_id, target_kind, rank, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                interaction.user_id,
                target.comic_id(),
                target.novel_id(),
                target.kind().as_str(),
                rank,
                datetime_to_timestamp(&interaction.created_at),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a favorite by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Favorite> {
        let sql = format!("SELECT {} FROM favorites WHERE id = ?1", FAVORITE_COLUMNS);
        conn.query_row(&sql, params![id], Self::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Favorite not found: {}", id)))
    }

    /// Find a user's favorite for a specific target
    pub fn find_by_target(conn: &Connection, owner: i64, target: Target) -> Result<Option<Favorite>> {
        let sql = format!(
            "SELECT {} FROM favorites WHERE user_id = ?1 AND {} = ?2",
            FAVORITE_COLUMNS,
            target.kind().column()
        );
        Ok(conn.query_row(&sql, params![owner, target.id()], Self::from_row).optional()?)
    }

    /// Check if a user has favorited a target
    pub fn is_favorited(conn: &Connection, owner: i64, target: Target) -> Result<bool> {
        Ok(Self::find_by_target(conn, owner, target)?.is_some())
    }

    /// Get a user's favorites ordered by rank, optionally for one kind only
    pub fn get_by_owner(conn: &Connection, owner: i64, kind: Option<TargetKind>) -> Result<Vec<Favorite>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM favorites
             WHERE user_id = ?1 AND (?2 IS NULL OR target_kind = ?2)
             ORDER BY rank, target_kind",
            FAVORITE_COLUMNS
        ))?;

        let favorites = stmt
            .query_map(params![owner, kind.map(|k| k.as_str())], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(favorites)
    }

    /// Like [`get_by_owner`](Self::get_by_owner), joined with the title, author,
    /// status and rating of each target
    pub fn get_details_by_owner(
        conn: &Connection,
        owner: i64,
        kind: Option<TargetKind>,
    ) -> Result<Vec<FavoriteDetail>> {
        let mut stmt = conn.prepare(
            "SELECT f.id, f.user_id, f.comic_id, f.novel_id, f.rank, f.created_at,
                    COALESCE(c.title, n.title), COALESCE(c.author, n.author),
                    COALESCE(c.status, n.status), COALESCE(c.average_rating, n.average_rating)
             FROM favorites f
             LEFT JOIN comics c ON c.id = f.comic_id
             LEFT JOIN novels n ON n.id = f.novel_id
             WHERE f.user_id = ?1 AND (?2 IS NULL OR f.target_kind = ?2)
             ORDER BY f.rank, f.target_kind",
        )?;

        let favorites = stmt
            .query_map(params![owner, kind.map(|k| k.as_str())], |row| {
                let detail = TargetDetail {
                    title: row.get(6)?,
                    author: row.get(7)?,
                    status: ContentStatus::from_str(&row.get::<_, String>(8)?)
                        .ok_or(rusqlite::Error::InvalidQuery)?,
                    average_rating: row.get(9)?,
                };
                Ok(FavoriteDetail::new(Self::from_row(row)?, detail))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(favorites)
    }

    /// Get every favorite pointing at a target, across all users
    pub fn get_by_target(conn: &Connection, target: Target) -> Result<Vec<Favorite>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM favorites WHERE {} = ?1 ORDER BY user_id",
            FAVORITE_COLUMNS,
            target.kind().column()
        ))?;

        let favorites = stmt
            .query_map(params![target.id()], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(favorites)
    }

    /// Look up several favorites at once; ids that do not exist are simply absent
    pub fn get_many(conn: &Connection, ids: &[i64]) -> Result<Vec<Favorite>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM favorites WHERE id = ?1",
            FAVORITE_COLUMNS
        ))?;

        let mut favorites = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(favorite) = stmt.query_row(params![id], Self::from_row).optional()? {
                favorites.push(favorite);
            }
        }
        Ok(favorites)
    }

    /// Ranks currently held in a partition as `(id, rank)` pairs
    pub fn get_ranks(conn: &Connection, partition: Partition) -> Result<Vec<(i64, i64)>> {
        let mut stmt = conn.prepare(
            "SELECT id, rank FROM favorites WHERE user_id = ?1 AND target_kind = ?2 ORDER BY rank",
        )?;

        let ranks = stmt
            .query_map(params![partition.owner, partition.kind.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ranks)
    }

    /// Number of favorites in a partition
    pub fn count(conn: &Connection, partition: Partition) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM favorites WHERE user_id = ?1 AND target_kind = ?2",
            params![partition.owner, partition.kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Highest rank in a partition, 0 when empty
    pub fn get_max_rank(conn: &Connection, partition: Partition) -> Result<i64> {
        let max_rank: Option<i64> = conn.query_row(
            "SELECT MAX(rank) FROM favorites WHERE user_id = ?1 AND target_kind = ?2",
            params![partition.owner, partition.kind.as_str()],
            |row| row.get(0),
        )?;

        Ok(max_rank.unwrap_or(0))
    }

    /// Overwrite the rank of one favorite
    pub fn update_rank(conn: &Connection, id: i64, rank: i64) -> Result<()> {
        let rows_affected = conn.execute(
            "UPDATE favorites SET rank = ?1 WHERE id = ?2",
            params![rank, id],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Favorite not found: {}", id)));
        }

        Ok(())
    }

    /// Add `delta` to every rank in `[from, to]` of a partition (`to = None` means unbounded).
    ///
    /// SQLite checks unique indexes row by row, so the shifted rows are first
    /// moved to distinct negative ranks and then flipped back. Callers must
    /// have vacated the slot the range moves into.
    pub fn shift_ranks(
        conn: &Connection,
        partition: Partition,
        from: i64,
        to: Option<i64>,
        delta: i64,
    ) -> Result<usize> {
        debug_assert!(from + delta >= 1, "shift would produce a non-positive rank");

        let shifted = conn.execute(
            "UPDATE favorites SET rank = -(rank + ?3)
             WHERE user_id = ?1 AND target_kind = ?2 AND rank >= ?4 AND rank <= ?5",
            params![
                partition.owner,
                partition.kind.as_str(),
                delta,
                from,
                to.unwrap_or(i64::MAX),
            ],
        )?;
        Self::restore_negated(conn, partition)?;

        Ok(shifted)
    }

    /// Park a favorite at a negated rank; pair with `restore_negated`.
    pub fn negate_rank(conn: &Connection, id: i64, rank: i64) -> Result<()> {
        Self::update_rank(conn, id, -rank)
    }

    /// Flip every negative rank in the partition back to positive
    pub fn restore_negated(conn: &Connection, partition: Partition) -> Result<usize> {
        let restored = conn.execute(
            "UPDATE favorites SET rank = -rank WHERE user_id = ?1 AND target_kind = ?2 AND rank < 0",
            params![partition.owner, partition.kind.as_str()],
        )?;
        Ok(restored)
    }

    /// Remove a favorite
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let rows_affected = conn.execute("DELETE FROM favorites WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Favorite not found: {}", id)));
        }

        Ok(())
    }
}
