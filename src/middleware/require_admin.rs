use axum::{extract::Request, middleware::Next, response::Response};

use crate::auth::AuthUser;
use crate::error::ApiError;

/// Role gate for the elevated tier. Must be layered inside [`super::jwt_auth_middleware`].
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(caller) = request.extensions().get::<AuthUser>().copied() else {
        tracing::error!(path = %request.uri().path(), "admin gate reached without an authenticated caller");
        return Err(ApiError::Unauthenticated);
    };

    caller.require_admin()?;
    Ok(next.run(request).await)
}
