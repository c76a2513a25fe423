mod content_repository;
mod database;
mod favorite_repository;
mod library_repository;
mod like_repository;
mod review_repository;
mod user_repository;

pub use content_repository::ContentRepository;
pub use database::{Connection, Database};
pub use favorite_repository::{FavoriteRepository, PARKED_RANK};
pub use library_repository::LibraryRepository;
pub use like_repository::LikeRepository;
pub use review_repository::ReviewRepository;
pub use user_repository::UserRepository;

use crate::models::Target;
use rusqlite::Row;

/// Read the nullable `comic_id`/`novel_id` column pair into a target.
pub(crate) fn target_from_row(row: &Row<'_>, comic_idx: usize, novel_idx: usize) -> rusqlite::Result<Target> {
    let comic: Option<i64> = row.get(comic_idx)?;
    let novel: Option<i64> = row.get(novel_idx)?;
    match (comic, novel) {
        (Some(id), None) => Ok(Target::Comic(id)),
        (None, Some(id)) => Ok(Target::Novel(id)),
        _ => Err(rusqlite::Error::InvalidQuery),
    }
}
