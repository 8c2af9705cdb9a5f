// handlers/public/accounts.rs - POST /auth/signup, POST /auth/login

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::database::models::UserSummary;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{LoginRequest, LoginResponse, SignupRequest};
use crate::state::AppState;

/// POST /auth/signup - Create a plain user account
///
/// Body: `{username, email, password, avatar?}`. Responds 201 with `{id, username, avatar, role}`.
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<UserSummary> {
    let Json(request) = body?;
    let user = state.accounts().signup(request).await?;
    Ok(ApiResponse::created(user))
}

/// POST /auth/login - Exchange credentials for a 6-hour token
///
/// Body: `{email, password}`. Responds with `{token, user}`.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = body?;
    let session = state.accounts().login(request).await?;
    Ok(ApiResponse::success(session))
}
