//! Review handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tsundoku_core::models::{Review, ReviewFilter};
use tsundoku_core::{NewReview, ReviewUpdate};

use super::blocking;
use crate::extract::{ApiJson, ApiQuery};
use crate::{ApiError, ApiState, CurrentUser, MaybeUser};

pub async fn list_reviews(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    ApiQuery(filter): ApiQuery<ReviewFilter>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state.reviews.clone();
    let viewer = user.map(|u| u.id);
    Ok(Json(blocking(move || reviews.list(&filter, viewer)).await?))
}

pub async fn create_review(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<NewReview>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let reviews = state.reviews.clone();
    let review = blocking(move || reviews.create(user.id, &request)).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn get_review(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<Review>, ApiError> {
    let reviews = state.reviews.clone();
    let viewer = user.map(|u| u.id);
    Ok(Json(blocking(move || reviews.get(id, viewer)).await?))
}

pub async fn update_review(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<ReviewUpdate>,
) -> Result<Json<Review>, ApiError> {
    let reviews = state.reviews.clone();
    Ok(Json(blocking(move || reviews.update(user.id, id, &update)).await?))
}

pub async fn delete_review(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let reviews = state.reviews.clone();
    blocking(move || reviews.delete(user.id, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
