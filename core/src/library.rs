use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::{now, LibraryEntry, LibraryFilter, LibraryStats, ReadingStatus, Target, TargetKind};
use crate::storage::{ContentRepository, Database, LibraryRepository};
use crate::{write_transaction, Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLibraryEntry {
    #[serde(default)]
    pub comic: Option<i64>,
    #[serde(default)]
    pub novel: Option<i64>,
    #[serde(default)]
    pub status: Option<ReadingStatus>,
    #[serde(default)]
    pub progress: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryUpdate {
    pub status: Option<ReadingStatus>,
    pub progress: Option<i64>,
}

/// Per-user reading status and progress.
#[derive(Debug, Clone)]
pub struct LibraryTracker {
    db: Database,
}

impl LibraryTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create(&self, user_id: i64, request: &NewLibraryEntry) -> Result<LibraryEntry> {
        let target = Target::from_parts(request.comic, request.novel)?;

        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;
        let total_chapters = ContentRepository::get_total_chapters(&tx, target)?;
        if LibraryRepository::find_by_target(&tx, user_id, target)?.is_some() {
            return Err(Error::Conflict(format!(
                "this {} is already in your library",
                target.kind()
            )));
        }

        let mut entry = LibraryEntry::new(user_id, target, total_chapters);
        if let Some(status) = request.status {
            entry.apply_status(status, entry.created_at);
        }
        if let Some(progress) = request.progress {
            entry.set_progress(progress)?;
        }

        let id = LibraryRepository::create(&tx, &entry)?;
        let created = LibraryRepository::get_by_id(&tx, id)?;
        tx.commit()?;

        tracing::info!(user_id, entry_id = id, %target, status = created.status.as_str(), "library entry created");
        Ok(created)
    }

    pub fn update(&self, actor: i64, entry_id: i64, update: &LibraryUpdate) -> Result<LibraryEntry> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        let mut entry = LibraryRepository::get_by_id(&tx, entry_id)?;
        if entry.user_id != actor {
            return Err(Error::PermissionDenied("you can only edit your own library".to_string()));
        }

        let now = now();
        if let Some(status) = update.status {
            entry.apply_status(status, now);
        }
        if let Some(progress) = update.progress {
            entry.set_progress(progress)?;
        }
        entry.updated_at = now;

        LibraryRepository::update(&tx, &entry)?;
        let updated = LibraryRepository::get_by_id(&tx, entry_id)?;
        tx.commit()?;

        tracing::debug!(entry_id, status = updated.status.as_str(), progress = updated.progress, "library entry updated");
        Ok(updated)
    }

    pub fn delete(&self, actor: i64, entry_id: i64) -> Result<()> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        let entry = LibraryRepository::get_by_id(&tx, entry_id)?;
        if entry.user_id != actor {
            return Err(Error::PermissionDenied("you can only delete your own library".to_string()));
        }
        LibraryRepository::delete(&tx, entry_id)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get(&self, entry_id: i64) -> Result<LibraryEntry> {
        let conn = self.db.connect()?;
        LibraryRepository::get_by_id(&conn, entry_id)
    }

    pub fn list(&self, user_id: i64, filter: &LibraryFilter) -> Result<Vec<LibraryEntry>> {
        let conn = self.db.connect()?;
        LibraryRepository::list(&conn, user_id, filter)
    }

    /// Counts per status and media type, plus the mean completion over
    /// entries whose chapter count is known.
    pub fn stats(&self, user_id: i64) -> Result<LibraryStats> {
        let entries = self.list(user_id, &LibraryFilter::default())?;

        let mut by_status: BTreeMap<String, i64> = ReadingStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut by_type: BTreeMap<String, i64> = TargetKind::ALL
            .iter()
            .map(|k| (k.as_str().to_string(), 0))
            .collect();

        let mut completion_sum = 0.0;
        let mut measured = 0usize;
        for entry in &entries {
            *by_status.entry(entry.status.as_str().to_string()).or_default() += 1;
            *by_type.entry(entry.target.kind().as_str().to_string()).or_default() += 1;
            if entry.total_chapters > 0 {
                completion_sum += entry.progress as f64 * 100.0 / entry.total_chapters as f64;
                measured += 1;
            }
        }

        let avg_completion = if measured == 0 {
            0.0
        } else {
            (completion_sum / measured as f64 * 100.0).round() / 100.0
        };

        Ok(LibraryStats {
            total: entries.len() as i64,
            by_status,
            by_type,
            avg_completion,
        })
    }
}
