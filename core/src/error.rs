use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A partition lock or the database write lock could not be taken in time.
    /// Callers may retry; the store never does.
    #[error("Resource busy: {0}")]
    Busy(String),
}

impl Error {
    /// True when the error is transient and the whole request can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Busy(_) => true,
            Error::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// True for a unique or check constraint failure reported by SQLite.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
