use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_id;
use crate::state::AppState;

/// DELETE /reviews/admin/:id - any standalone review, regardless of author
pub async fn delete_any_review(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id("review", &id)?;
    state.reviews().delete_any(caller, id).await?;
    Ok(ApiResponse::message("Review deleted"))
}
