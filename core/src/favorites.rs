//! Ranked favorites.
//!
//! Each user keeps one ranking of favorite comics and one of favorite novels.
//! Within such a partition the ranks are always exactly `1..=N`: creates
//! insert and shift, moves rotate the affected range, deletes compact.
//!
//! Mutations hold the partition lock from their first rank read until commit
//! and run in a single IMMEDIATE transaction. Shifts pass through negative
//! ranks (see [`FavoriteRepository::shift_ranks`]) so the unique rank index is
//! never violated mid-statement.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;

use crate::catalog::TargetDeletionListener;
use crate::locks::PartitionLocks;
use crate::models::{Favorite, FavoriteDetail, Interaction, NewFavorite, Partition, RankAssignment, Target, TargetKind};
use crate::storage::{ContentRepository, Database, FavoriteRepository, PARKED_RANK};
use crate::{write_transaction, Error, Result};

#[derive(Clone)]
pub struct RankedFavoriteStore {
    db: Database,
    locks: Arc<PartitionLocks>,
}

impl RankedFavoriteStore {
    pub fn new(db: Database, lock_timeout: Duration) -> Self {
        Self {
            db,
            locks: Arc::new(PartitionLocks::new(lock_timeout)),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Favorite a comic or novel.
    ///
    /// Without a rank the favorite is appended. An explicit rank pushes every
    /// favorite at or below it down by one; ranks past the end are clamped to
    /// `count + 1`.
    pub fn create(&self, owner: i64, request: &NewFavorite) -> Result<Favorite> {
        let target = Target::from_parts(request.comic, request.novel)?;
        if let Some(rank) = request.rank {
            if rank < 1 {
                return Err(Error::Validation("rank must be at least 1".to_string()));
            }
        }

        let partition = Partition::new(owner, target.kind());
        let _guard = self.locks.lock(partition)?;
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        ContentRepository::ensure_exists(&tx, target)?;
        if FavoriteRepository::is_favorited(&tx, owner, target)? {
            return Err(Error::Conflict(format!("{} is already in your favorites", target)));
        }

        let count = FavoriteRepository::count(&tx, partition)?;
        let rank = match request.rank {
            None => FavoriteRepository::get_max_rank(&tx, partition)? + 1,
            Some(rank) => rank.min(count + 1),
        };
        if rank <= count {
            let shifted = FavoriteRepository::shift_ranks(&tx, partition, rank, None, 1)?;
            tracing::debug!(%partition, rank, shifted, "made room for favorite");
        }

        let id = FavoriteRepository::create(&tx, &Interaction::new(owner), target, rank)?;
        let favorite = FavoriteRepository::get_by_id(&tx, id)?;
        tx.commit()?;

        tracing::info!(%partition, favorite_id = id, %target, rank, "favorite created");
        Ok(favorite)
    }

    /// Move a favorite to `new_rank`, rotating the favorites in between by one.
    ///
    /// Ranks past the end of the partition are clamped to its last position.
    pub fn move_to(&self, actor: i64, favorite_id: i64, new_rank: i64) -> Result<Favorite> {
        if new_rank < 1 {
            return Err(Error::Validation("rank must be at least 1".to_string()));
        }

        let partition = self.authorize(actor, favorite_id)?;
        let _guard = self.locks.lock(partition)?;
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        // re-read under the lock; the favorite may have been deleted meanwhile
        let favorite = FavoriteRepository::get_by_id(&tx, favorite_id)?;
        let old_rank = favorite.rank;
        let new_rank = new_rank.min(FavoriteRepository::count(&tx, partition)?);

        if new_rank == old_rank {
            return Ok(favorite);
        }

        FavoriteRepository::update_rank(&tx, favorite_id, PARKED_RANK)?;
        let shifted = if new_rank < old_rank {
            FavoriteRepository::shift_ranks(&tx, partition, new_rank, Some(old_rank - 1), 1)?
        } else {
            FavoriteRepository::shift_ranks(&tx, partition, old_rank + 1, Some(new_rank), -1)?
        };
        FavoriteRepository::update_rank(&tx, favorite_id, new_rank)?;

        let favorite = FavoriteRepository::get_by_id(&tx, favorite_id)?;
        tx.commit()?;

        tracing::debug!(%partition, favorite_id, old_rank, new_rank, shifted, "favorite moved");
        Ok(favorite)
    }

    /// Remove a favorite and close the gap it leaves.
    pub fn delete(&self, actor: i64, favorite_id: i64) -> Result<()> {
        let partition = self.authorize(actor, favorite_id)?;
        let _guard = self.locks.lock(partition)?;
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        let favorite = FavoriteRepository::get_by_id(&tx, favorite_id)?;
        Self::remove_and_compact(&tx, &favorite)?;
        tx.commit()?;

        tracing::info!(%partition, favorite_id, rank = favorite.rank, "favorite deleted");
        Ok(())
    }

    /// Overwrite the ranks of several favorites at once.
    ///
    /// The batch is all-or-nothing: it must not be empty, every id must
    /// belong to `owner`, ids and ranks must be unique across the whole
    /// batch, and each affected partition must end up with ranks exactly
    /// `1..=N`. Returns the number of favorites written.
    pub fn bulk_reorder(&self, owner: i64, assignments: &[RankAssignment]) -> Result<usize> {
        Self::check_assignments(assignments)?;

        let ids: Vec<i64> = assignments.iter().map(|a| a.id).collect();
        let partitions: BTreeSet<Partition> = {
            let conn = self.db.connect()?;
            Self::owned_favorites(&conn, owner, &ids)?
                .values()
                .map(Favorite::partition)
                .collect()
        };

        let _guards = self.locks.lock_all(partitions.iter().copied())?;
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        // ownership can only change by deletion, which the re-read catches
        let favorites = Self::owned_favorites(&tx, owner, &ids)?;
        let mut by_partition: BTreeMap<Partition, Vec<RankAssignment>> = BTreeMap::new();
        for assignment in assignments {
            if let Some(favorite) = favorites.get(&assignment.id) {
                by_partition.entry(favorite.partition()).or_default().push(*assignment);
            }
        }

        for (partition, batch) in &by_partition {
            let mut ranks: HashMap<i64, i64> = FavoriteRepository::get_ranks(&tx, *partition)?
                .into_iter()
                .collect();
            for assignment in batch {
                ranks.insert(assignment.id, assignment.rank);
            }
            let mut resulting: Vec<i64> = ranks.into_values().collect();
            resulting.sort_unstable();
            if resulting.iter().zip(1..).any(|(rank, expected)| *rank != expected) {
                return Err(Error::Validation(format!(
                    "{} favorite ranks must be exactly 1 to {} after reordering",
                    partition.kind,
                    resulting.len()
                )));
            }
        }

        for (partition, batch) in &by_partition {
            for assignment in batch {
                FavoriteRepository::negate_rank(&tx, assignment.id, assignment.rank)?;
            }
            FavoriteRepository::restore_negated(&tx, *partition)?;
            tracing::debug!(%partition, count = batch.len(), "favorites reordered");
        }
        tx.commit()?;

        Ok(assignments.len())
    }

    /// A user's favorites ordered by rank, optionally for one kind only
    pub fn list(&self, owner: i64, kind: Option<TargetKind>) -> Result<Vec<Favorite>> {
        let conn = self.db.connect()?;
        FavoriteRepository::get_by_owner(&conn, owner, kind)
    }

    /// [`list`](Self::list) with each target's display fields joined in.
    pub fn list_detailed(&self, owner: i64, kind: Option<TargetKind>) -> Result<Vec<FavoriteDetail>> {
        let conn = self.db.connect()?;
        FavoriteRepository::get_details_by_owner(&conn, owner, kind)
    }

    pub fn get(&self, favorite_id: i64) -> Result<Favorite> {
        let conn = self.db.connect()?;
        FavoriteRepository::get_by_id(&conn, favorite_id)
    }

    /// Resolve the partition of a favorite the actor owns.
    /// Owner and target never change, so this is safe to read before locking.
    fn authorize(&self, actor: i64, favorite_id: i64) -> Result<Partition> {
        let favorite = self.get(favorite_id)?;
        if !favorite.interaction.is_owned_by(actor) {
            return Err(Error::PermissionDenied(
                "you can only change your own favorites".to_string(),
            ));
        }
        Ok(favorite.partition())
    }

    fn check_assignments(assignments: &[RankAssignment]) -> Result<()> {
        if assignments.is_empty() {
            return Err(Error::Validation("favorites must not be empty".to_string()));
        }

        let mut ids = HashSet::new();
        let mut ranks = HashSet::new();
        for assignment in assignments {
            if assignment.rank < 1 {
                return Err(Error::Validation(format!(
                    "rank for favorite {} must be at least 1",
                    assignment.id
                )));
            }
            if !ids.insert(assignment.id) {
                return Err(Error::Validation(format!(
                    "favorite {} appears more than once",
                    assignment.id
                )));
            }
            if !ranks.insert(assignment.rank) {
                return Err(Error::Validation(format!(
                    "rank {} is assigned more than once",
                    assignment.rank
                )));
            }
        }
        Ok(())
    }

    /// Load the favorites behind `ids`, failing with every id that is missing or foreign.
    fn owned_favorites(conn: &Connection, owner: i64, ids: &[i64]) -> Result<HashMap<i64, Favorite>> {
        let found: HashMap<i64, Favorite> = FavoriteRepository::get_many(conn, ids)?
            .into_iter()
            .filter(|f| f.interaction.is_owned_by(owner))
            .map(|f| (f.id, f))
            .collect();

        let mut invalid: Vec<i64> = ids.iter().copied().filter(|id| !found.contains_key(id)).collect();
        if !invalid.is_empty() {
            invalid.sort_unstable();
            let listed: Vec<String> = invalid.iter().map(i64::to_string).collect();
            return Err(Error::Validation(format!(
                "invalid or unauthorized favorite IDs: {}",
                listed.join(", ")
            )));
        }
        Ok(found)
    }

    fn remove_and_compact(conn: &Connection, favorite: &Favorite) -> Result<()> {
        FavoriteRepository::delete(conn, favorite.id)?;
        let shifted = FavoriteRepository::shift_ranks(conn, favorite.partition(), favorite.rank + 1, None, -1)?;
        tracing::debug!(partition = %favorite.partition(), rank = favorite.rank, shifted, "compacted favorites");
        Ok(())
    }
}

/// Content deletion removes every favorite of the target, compacting each owner's ranking.
///
/// Runs inside the catalog's write transaction, which already excludes every
/// other writer, so the partition locks are not taken here.
impl TargetDeletionListener for RankedFavoriteStore {
    fn on_target_deleted(&self, conn: &Connection, target: Target) -> Result<()> {
        let favorites = FavoriteRepository::get_by_target(conn, target)?;
        for favorite in &favorites {
            Self::remove_and_compact(conn, favorite)?;
        }
        if !favorites.is_empty() {
            tracing::info!(%target, removed = favorites.len(), "favorites removed with deleted content");
        }
        Ok(())
    }
}
