use axum::{extract::State, Extension};

use crate::auth::AuthUser;
use crate::database::models::PopulatedUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /auth/verify - the caller's own profile with favorites resolved
pub async fn verify(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<PopulatedUser> {
    Ok(ApiResponse::success(state.accounts().current_user(caller).await?))
}
