//! Ranked favorites handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tsundoku_core::models::{Favorite, FavoriteDetail, NewFavorite, RankAssignment, TargetKind};
use tsundoku_core::Error as CoreError;

use super::{blocking, resolve_owner};
use crate::extract::{ApiJson, ApiQuery};
use crate::{ApiError, ApiState, CurrentUser, MaybeUser};

#[derive(Debug, Deserialize)]
pub struct FavoriteQuery {
    pub username: Option<String>,
    /// `comic` or `novel`; anything else lists both.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoritePatch {
    pub rank: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub favorites: Vec<RankAssignment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReorderResponse {
    pub message: String,
    pub count: usize,
}

/// List favorites ordered by rank, each with its target's title, author, status and rating.
pub async fn list_favorites(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    ApiQuery(query): ApiQuery<FavoriteQuery>,
) -> Result<Json<Vec<FavoriteDetail>>, ApiError> {
    let Some(owner) = resolve_owner(&state.db, query.username, user.as_ref()).await? else {
        return Ok(Json(Vec::new()));
    };
    let kind = query.kind.as_deref().and_then(TargetKind::from_str);

    let store = state.favorites.clone();
    let favorites = blocking(move || store.list_detailed(owner, kind)).await?;
    Ok(Json(favorites))
}

/// Favorite a comic or novel, appended or at an explicit rank.
pub async fn create_favorite(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<NewFavorite>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    let store = state.favorites.clone();
    let favorite = blocking(move || store.create(user.id, &request)).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn get_favorite(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<Favorite>, ApiError> {
    let store = state.favorites.clone();
    Ok(Json(blocking(move || store.get(id)).await?))
}

/// Move a favorite to a new rank.
pub async fn update_favorite(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<FavoritePatch>,
) -> Result<Json<Favorite>, ApiError> {
    let store = state.favorites.clone();
    let favorite = blocking(move || match patch.rank {
        Some(rank) => store.move_to(user.id, id, rank),
        None => {
            let favorite = store.get(id)?;
            if favorite.owner() != user.id {
                return Err(CoreError::PermissionDenied(
                    "you can only change your own favorites".to_string(),
                ));
            }
            Ok(favorite)
        }
    })
    .await?;
    Ok(Json(favorite))
}

pub async fn delete_favorite(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let store = state.favorites.clone();
    blocking(move || store.delete(user.id, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Overwrite several ranks at once.
pub async fn reorder_favorites(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let store = state.favorites.clone();
    let count = blocking(move || store.bulk_reorder(user.id, &request.favorites)).await?;
    Ok(Json(ReorderResponse {
        message: "Favorites reordered successfully".to_string(),
        count,
    }))
}
