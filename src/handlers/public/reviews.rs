use axum::extract::{Path, State};

use crate::database::models::ReviewWithAuthor;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_id;
use crate::state::AppState;

/// GET /reviews/album/:id - newest first, each with its author's public profile
pub async fn album_reviews(
    State(state): State<AppState>,
    Path(album_id): Path<String>,
) -> ApiResult<Vec<ReviewWithAuthor>> {
    let album_id = parse_id("album", &album_id)?;
    Ok(ApiResponse::success(state.reviews().list_for_album(album_id).await?))
}
