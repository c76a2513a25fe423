//! Error-to-HTTP mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tsundoku_core::rusqlite;
use tsundoku_core::Error as CoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthenticated,

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => core_status(err),
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) | CoreError::Database(rusqlite::Error::QueryReturnedNoRows) => StatusCode::NOT_FOUND,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        err if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        // a uniqueness race the store's own checks did not see
        err if err.is_constraint_violation() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "The server is busy, please retry.".to_string(),
                _ => "Internal server error.".to_string(),
            }
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::Conflict("x".into()), StatusCode::CONFLICT),
            (CoreError::Busy("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_sqlite_errors() {
        let no_rows = ApiError::from(CoreError::Database(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(no_rows.status_code(), StatusCode::NOT_FOUND);

        let busy = ApiError::from(CoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        )));
        assert_eq!(busy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
