use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Token literals that client-side storage bugs send in place of a real token
const PLACEHOLDER_TOKENS: [&str; 2] = ["null", "undefined"];

/// JWT authentication middleware: verifies the bearer token and attaches the caller's
/// identity to the request as an [`AuthUser`] extension.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).inspect_err(|e| {
        tracing::warn!(path = %request.uri().path(), code = e.error_code(), "authentication rejected");
    })?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::warn!(path = %request.uri().path(), "token rejected: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Requires exactly `Bearer <token>` with a real token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers.get(AUTHORIZATION).ok_or(ApiError::MissingCredential)?;
    let value = value.to_str().map_err(|_| ApiError::MalformedCredential)?;

    // Exactly one space between scheme and token; extra separators leave an empty part.
    let mut parts = value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ApiError::MalformedCredential);
    };

    if scheme != "Bearer" || token.is_empty() || PLACEHOLDER_TOKENS.contains(&token) {
        return Err(ApiError::MalformedCredential);
    }
    Ok(token)
}
