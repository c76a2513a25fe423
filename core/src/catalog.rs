use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;

use crate::models::{Content, ContentFilter, Genre, NewContent, Target, TargetKind, TargetRef};
use crate::storage::{ContentRepository, Database, ReviewRepository};
use crate::{write_transaction, Result};

/// Notified when a comic or novel is about to be deleted.
///
/// Listeners run inside the catalog's write transaction before the row is
/// removed; an error aborts the whole deletion.
pub trait TargetDeletionListener: Send + Sync {
    fn on_target_deleted(&self, conn: &Connection, target: Target) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_comics: i64,
    pub total_novels: i64,
    pub total_genres: i64,
    pub total_reviews: i64,
}

/// Comics, novels and genres.
#[derive(Clone)]
pub struct ContentCatalog {
    db: Database,
    listeners: Vec<Arc<dyn TargetDeletionListener>>,
}

impl ContentCatalog {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn TargetDeletionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn create_content(&self, kind: TargetKind, content: &NewContent) -> Result<Content> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;
        let id = ContentRepository::create(&tx, kind, content)?;
        let created = ContentRepository::get_by_id(&tx, kind, id)?;
        tx.commit()?;

        tracing::info!(%kind, id, title = %created.title, "content created");
        Ok(created)
    }

    pub fn get_content(&self, kind: TargetKind, id: i64) -> Result<Content> {
        let conn = self.db.connect()?;
        ContentRepository::get_by_id(&conn, kind, id)
    }

    pub fn list_content(&self, kind: TargetKind, filter: &ContentFilter) -> Result<Vec<Content>> {
        let conn = self.db.connect()?;
        ContentRepository::list(&conn, kind, filter)
    }

    pub fn get_target(&self, kind: TargetKind, id: i64) -> Result<TargetRef> {
        let conn = self.db.connect()?;
        ContentRepository::get_target(&conn, kind, id)
    }

    /// Delete a comic or novel after every listener has cleaned up after it.
    pub fn delete_content(&self, kind: TargetKind, id: i64) -> Result<()> {
        let target = Target::new(kind, id);
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;

        ContentRepository::ensure_exists(&tx, target)?;
        for listener in &self.listeners {
            listener.on_target_deleted(&tx, target)?;
        }
        ContentRepository::delete(&tx, kind, id)?;
        tx.commit()?;

        tracing::info!(%target, "content deleted");
        Ok(())
    }

    /// Recompute the average rating of a target from its reviews
    pub fn refresh_average_rating(&self, target: Target) -> Result<f64> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;
        let rating = ContentRepository::refresh_average_rating(&tx, target)?;
        tx.commit()?;
        Ok(rating)
    }

    pub fn create_genre(&self, name: &str) -> Result<Genre> {
        let mut conn = self.db.connect()?;
        let tx = write_transaction(&mut conn)?;
        let genre = ContentRepository::create_genre(&tx, name)?;
        tx.commit()?;
        Ok(genre)
    }

    pub fn list_genres(&self) -> Result<Vec<Genre>> {
        let conn = self.db.connect()?;
        ContentRepository::list_genres(&conn)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        let conn = self.db.connect()?;
        Ok(CatalogStats {
            total_comics: ContentRepository::count(&conn, TargetKind::Comic)?,
            total_novels: ContentRepository::count(&conn, TargetKind::Novel)?,
            total_genres: ContentRepository::count_genres(&conn)?,
            total_reviews: ReviewRepository::count(&conn)?,
        })
    }

    /// Up to ten well-rated titles, matched to the genres of `user`'s library when known
    pub fn recommendations(&self, kind: TargetKind, user: Option<i64>) -> Result<Vec<Content>> {
        let conn = self.db.connect()?;
        ContentRepository::recommendations(&conn, kind, user)
    }
}
