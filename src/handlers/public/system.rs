// handlers/public/system.rs - GET / and GET /health

use axum::extract::State;
use serde_json::{json, Value};

use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET / - service identity and route overview
pub async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "auth": "/auth/signup, /auth/login (public), /auth/verify (token)",
            "catalog": "/artists, /albums, /search (public read, admin write)",
            "reviews": "/reviews (token), /reviews/album/:id (public)",
            "users": "/users (token; listing and admin changes require admin)",
            "health": "/health"
        }
    })))
}

/// GET /health - 200 when the store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.store.ping().await.map_err(|e| {
        tracing::error!("health check failed: {}", e);
        ApiError::service_unavailable("Database unreachable")
    })?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "store": state.store.backend(),
        "environment": format!("{:?}", state.config.environment).to_lowercase(),
    })))
}
