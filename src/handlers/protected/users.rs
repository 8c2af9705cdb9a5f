// handlers/protected/users.rs - Self-service account endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::database::models::PopulatedUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_id;
use crate::services::{PasswordChange, ProfileUpdate};
use crate::state::AppState;
use crate::types::FavoriteKind;

/// GET /users/:id - self or admin
pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<PopulatedUser> {
    let id = parse_id("user", &id)?;
    Ok(ApiResponse::success(state.users().get(caller, id).await?))
}

/// PUT /users/:id - self or admin; `{username?, email?, avatar?}`
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<PopulatedUser> {
    let id = parse_id("user", &id)?;
    let Json(update) = body?;
    Ok(ApiResponse::success(state.users().update_profile(caller, id, update).await?))
}

/// PUT /users/:id/change-password - self only; `{currentPassword, newPassword}`
pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<PasswordChange>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id("user", &id)?;
    let Json(change) = body?;
    state.users().change_password(caller, id, change).await?;
    Ok(ApiResponse::message("Password updated successfully"))
}

async fn add_favorite(
    state: AppState,
    caller: AuthUser,
    kind: FavoriteKind,
    (user_id, item_id): (String, String),
) -> ApiResult<PopulatedUser> {
    let user_id = parse_id("user", &user_id)?;
    let item_id = parse_id(kind.label(), &item_id)?;
    let user = state.users().add_favorite(caller, user_id, kind, item_id).await?;
    Ok(ApiResponse::success(user))
}

async fn remove_favorite(
    state: AppState,
    caller: AuthUser,
    kind: FavoriteKind,
    (user_id, item_id): (String, String),
) -> ApiResult<PopulatedUser> {
    let user_id = parse_id("user", &user_id)?;
    let item_id = parse_id(kind.label(), &item_id)?;
    let user = state.users().remove_favorite(caller, user_id, kind, item_id).await?;
    Ok(ApiResponse::success(user))
}

/// POST /users/:id/favorites/albums/:item_id
pub async fn add_favorite_album(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(ids): Path<(String, String)>,
) -> ApiResult<PopulatedUser> {
    add_favorite(state, caller, FavoriteKind::Album, ids).await
}

/// DELETE /users/:id/favorites/albums/:item_id
pub async fn remove_favorite_album(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(ids): Path<(String, String)>,
) -> ApiResult<PopulatedUser> {
    remove_favorite(state, caller, FavoriteKind::Album, ids).await
}

/// POST /users/:id/favorites/artists/:item_id
pub async fn add_favorite_artist(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(ids): Path<(String, String)>,
) -> ApiResult<PopulatedUser> {
    add_favorite(state, caller, FavoriteKind::Artist, ids).await
}

/// DELETE /users/:id/favorites/artists/:item_id
pub async fn remove_favorite_artist(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(ids): Path<(String, String)>,
) -> ApiResult<PopulatedUser> {
    remove_favorite(state, caller, FavoriteKind::Artist, ids).await
}
