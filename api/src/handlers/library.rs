//! Library (reading list) handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tsundoku_core::models::{LibraryEntry, LibraryFilter, LibraryStats};
use tsundoku_core::{LibraryUpdate, NewLibraryEntry};

use super::{blocking, resolve_owner};
use crate::extract::{ApiJson, ApiQuery};
use crate::{ApiError, ApiState, CurrentUser, MaybeUser};

#[derive(Debug, Deserialize)]
pub struct LibraryQuery {
    pub username: Option<String>,
    pub status: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub username: Option<String>,
}

/// Library entry with its derived progress fields.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    #[serde(flatten)]
    pub entry: LibraryEntry,
    pub completion_percentage: f64,
    pub is_caught_up: bool,
}

impl From<LibraryEntry> for EntryResponse {
    fn from(entry: LibraryEntry) -> Self {
        Self {
            completion_percentage: entry.completion_percentage(),
            is_caught_up: entry.is_caught_up(),
            entry,
        }
    }
}

pub async fn list_entries(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    ApiQuery(query): ApiQuery<LibraryQuery>,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let Some(owner) = resolve_owner(&state.db, query.username, user.as_ref()).await? else {
        return Ok(Json(Vec::new()));
    };
    let filter = LibraryFilter {
        status: query.status,
        media_type: query.media_type,
    };

    let library = state.library.clone();
    let entries = blocking(move || library.list(owner, &filter)).await?;
    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// Library statistics for `?username=` or the caller.
pub async fn stats(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<LibraryStats>, ApiError> {
    let owner = resolve_owner(&state.db, query.username, user.as_ref())
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    let library = state.library.clone();
    Ok(Json(blocking(move || library.stats(owner)).await?))
}

pub async fn create_entry(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<NewLibraryEntry>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    let library = state.library.clone();
    let entry = blocking(move || library.create(user.id, &request)).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn get_entry(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<EntryResponse>, ApiError> {
    let library = state.library.clone();
    Ok(Json(blocking(move || library.get(id)).await?.into()))
}

pub async fn update_entry(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<LibraryUpdate>,
) -> Result<Json<EntryResponse>, ApiError> {
    let library = state.library.clone();
    Ok(Json(blocking(move || library.update(user.id, id, &update)).await?.into()))
}

pub async fn delete_entry(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let library = state.library.clone();
    blocking(move || library.delete(user.id, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
