// handlers/elevated/users.rs - Admin account management

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_id;
use crate::services::AdminUserUpdate;
use crate::state::AppState;

/// GET /users - every account, credentials omitted
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    Ok(ApiResponse::success(state.users().list().await?))
}

/// PATCH /users/:id - `{username?, email?, password?, role?}`
///
/// Changing your own role is refused, as is demoting the last admin.
pub async fn admin_update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<AdminUserUpdate>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let id = parse_id("user", &id)?;
    let Json(update) = body?;
    Ok(ApiResponse::success(state.users().admin_update(caller, id, update).await?))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id("user", &id)?;
    state.users().delete(caller, id).await?;
    Ok(ApiResponse::message("User deleted"))
}
