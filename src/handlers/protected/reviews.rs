// handlers/protected/reviews.rs - Posting reviews and deleting your own

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::database::models::{EmbeddedReview, Review, ReviewTarget};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_id;
use crate::services::{EmbeddedReviewInput, ReviewInput};
use crate::state::AppState;

/// POST /artists/:id/reviews - rating 1-5, comment required
pub async fn review_artist(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<EmbeddedReviewInput>, JsonRejection>,
) -> ApiResult<EmbeddedReview> {
    let target = ReviewTarget::Artist(parse_id("artist", &id)?);
    let Json(input) = body?;
    Ok(ApiResponse::created(state.catalog().add_review(caller, target, input).await?))
}

/// POST /albums/:id/reviews - rating 1-5, comment required
pub async fn review_album(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<EmbeddedReviewInput>, JsonRejection>,
) -> ApiResult<EmbeddedReview> {
    let target = ReviewTarget::Album(parse_id("album", &id)?);
    let Json(input) = body?;
    Ok(ApiResponse::created(state.catalog().add_review(caller, target, input).await?))
}

/// POST /reviews - `{album, rating, comment?}`, rating 1-10
pub async fn create_review(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    body: Result<Json<ReviewInput>, JsonRejection>,
) -> ApiResult<Review> {
    let Json(input) = body?;
    Ok(ApiResponse::created(state.reviews().create(caller, input).await?))
}

/// DELETE /reviews/:id - only the author; anything else is a 404
pub async fn delete_own_review(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id("review", &id)?;
    state.reviews().delete_own(caller, id).await?;
    Ok(ApiResponse::message("Review deleted"))
}
