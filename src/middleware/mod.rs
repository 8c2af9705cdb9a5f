pub mod auth;
pub mod require_admin;
pub mod response;

pub use auth::{extract_bearer_token, jwt_auth_middleware};
pub use require_admin::require_admin_middleware;
pub use response::{ApiResponse, ApiResult};
