//! Status and health check handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::{ApiError, ApiState};

/// Health response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,

    /// Crate version of the running server.
    pub version: String,

    /// Schema version recorded in the database.
    pub schema_version: i32,
}

/// Health check endpoint; fails when the database cannot be reached.
pub async fn health(State(state): State<Arc<ApiState>>) -> Result<Json<HealthResponse>, ApiError> {
    let db = state.db.clone();
    let schema_version = blocking(move || {
        let conn = db.connect()?;
        db.get_schema_version(&conn)
    })
    .await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version,
    }))
}
