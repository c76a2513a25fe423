//! API request handlers.

pub mod catalog;
pub mod favorites;
pub mod library;
pub mod likes;
pub mod reviews;
pub mod status;

use tsundoku_core::storage::UserRepository;
use tsundoku_core::Database;

use crate::{ApiError, AuthUser};

/// Run a store operation on the blocking pool.
pub(crate) async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> tsundoku_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(op).await??)
}

/// Whose data a listing shows: `?username=` when given, else the caller.
/// `None` means an anonymous caller asked for their own data.
pub(crate) async fn resolve_owner(
    db: &Database,
    username: Option<String>,
    viewer: Option<&AuthUser>,
) -> Result<Option<i64>, ApiError> {
    match username {
        Some(username) => {
            let db = db.clone();
            let user = blocking(move || {
                let conn = db.connect()?;
                UserRepository::get_by_username(&conn, &username)
            })
            .await?;
            Ok(Some(user.id))
        }
        None => Ok(viewer.map(|user| user.id)),
    }
}
