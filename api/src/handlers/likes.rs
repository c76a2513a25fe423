//! Review like handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tsundoku_core::models::Like;

use super::blocking;
use crate::extract::ApiJson;
use crate::{ApiError, ApiState, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub review: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub liked: bool,
    pub likes_count: i64,
    pub message: String,
}

/// The caller's likes, newest first.
pub async fn list_likes(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Like>>, ApiError> {
    let reviews = state.reviews.clone();
    Ok(Json(blocking(move || reviews.list_likes(user.id)).await?))
}

/// Like a review, or unlike it if already liked. 201 when a like was created.
pub async fn toggle_like(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<ToggleRequest>,
) -> Result<(StatusCode, Json<ToggleResponse>), ApiError> {
    let reviews = state.reviews.clone();
    let toggle = blocking(move || reviews.toggle_like(user.id, request.review)).await?;

    let (status, message) = if toggle.liked {
        (StatusCode::CREATED, "Review liked")
    } else {
        (StatusCode::OK, "Review unliked")
    };
    Ok((
        status,
        Json(ToggleResponse {
            liked: toggle.liked,
            likes_count: toggle.likes_count,
            message: message.to_string(),
        }),
    ))
}
