//! Comic, novel and genre handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tsundoku_core::models::{Content, ContentFilter, Genre, NewContent, TargetKind};
use tsundoku_core::CatalogStats;

use super::blocking;
use crate::extract::{ApiJson, ApiQuery};
use crate::{ApiError, ApiState, CurrentUser, MaybeUser};

type AppState = State<Arc<ApiState>>;

#[derive(Debug, Deserialize)]
pub struct GenreRequest {
    pub name: String,
}

/// Mount list/create, get/delete and recommendations for one kind of content under `base`.
pub fn content_routes(router: Router<Arc<ApiState>>, kind: TargetKind, base: &str) -> Router<Arc<ApiState>> {
    router
        .route(
            base,
            get(move |state: AppState, query: ApiQuery<ContentFilter>| list_content(kind, state, query)).post(
                move |state: AppState, user: CurrentUser, body: ApiJson<NewContent>| {
                    create_content(kind, state, user, body)
                },
            ),
        )
        .route(
            &format!("{}/recommendations", base),
            get(move |state: AppState, user: MaybeUser| recommendations(kind, state, user)),
        )
        .route(
            &format!("{}/:id", base),
            get(move |state: AppState, id: Path<i64>| get_content(kind, state, id)).delete(
                move |state: AppState, user: CurrentUser, id: Path<i64>| delete_content(kind, state, user, id),
            ),
        )
}

pub async fn list_content(
    kind: TargetKind,
    State(state): AppState,
    ApiQuery(filter): ApiQuery<ContentFilter>,
) -> Result<Json<Vec<Content>>, ApiError> {
    let catalog = state.catalog.clone();
    Ok(Json(blocking(move || catalog.list_content(kind, &filter)).await?))
}

/// Admin only.
pub async fn create_content(
    kind: TargetKind,
    State(state): AppState,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<NewContent>,
) -> Result<(StatusCode, Json<Content>), ApiError> {
    user.require_admin()?;
    let catalog = state.catalog.clone();
    let content = blocking(move || catalog.create_content(kind, &request)).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

pub async fn get_content(
    kind: TargetKind,
    State(state): AppState,
    Path(id): Path<i64>,
) -> Result<Json<Content>, ApiError> {
    let catalog = state.catalog.clone();
    Ok(Json(blocking(move || catalog.get_content(kind, id)).await?))
}

/// Admin only. Favorites of the deleted title are removed and compacted first.
pub async fn delete_content(
    kind: TargetKind,
    State(state): AppState,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;
    let catalog = state.catalog.clone();
    blocking(move || catalog.delete_content(kind, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recommendations(
    kind: TargetKind,
    State(state): AppState,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<Content>>, ApiError> {
    let catalog = state.catalog.clone();
    let user = user.map(|u| u.id);
    Ok(Json(blocking(move || catalog.recommendations(kind, user)).await?))
}

pub async fn list_genres(State(state): AppState) -> Result<Json<Vec<Genre>>, ApiError> {
    let catalog = state.catalog.clone();
    Ok(Json(blocking(move || catalog.list_genres()).await?))
}

/// Admin only.
pub async fn create_genre(
    State(state): AppState,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<GenreRequest>,
) -> Result<(StatusCode, Json<Genre>), ApiError> {
    user.require_admin()?;
    let catalog = state.catalog.clone();
    let genre = blocking(move || catalog.create_genre(&request.name)).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// Catalog totals.
pub async fn stats(State(state): AppState) -> Result<Json<CatalogStats>, ApiError> {
    let catalog = state.catalog.clone();
    Ok(Json(blocking(move || catalog.stats()).await?))
}
