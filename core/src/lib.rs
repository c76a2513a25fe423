//! Core library for tsundoku: a catalog and reading tracker for comics and novels.
//!
//! The storage layer is plain SQLite accessed through repository types. The
//! service types on top of it ([`RankedFavoriteStore`], [`ContentCatalog`],
//! [`ReviewStore`], [`LibraryTracker`]) each run one operation per
//! IMMEDIATE transaction.

pub mod catalog;
pub mod error;
pub mod favorites;
pub mod library;
pub mod locks;
pub mod models;
pub mod reviews;
pub mod storage;

pub use catalog::{CatalogStats, ContentCatalog, TargetDeletionListener};
pub use error::{Error, Result};
pub use favorites::RankedFavoriteStore;
pub use library::{LibraryTracker, LibraryUpdate, NewLibraryEntry};
pub use locks::{PartitionGuard, PartitionLocks, DEFAULT_LOCK_TIMEOUT};
pub use reviews::{LikeToggle, NewReview, ReviewStore, ReviewUpdate};
pub use storage::Database;

pub use rusqlite;

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Open a write transaction that takes SQLite's write lock up front.
///
/// Reads made inside it cannot go stale before commit, and a second writer
/// waits for the busy timeout and then fails with a transient error.
pub(crate) fn write_transaction(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}
