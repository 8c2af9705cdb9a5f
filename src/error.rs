// HTTP API Error Types
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::{PasswordError, TokenError};
use crate::database::StoreError;

const INTERNAL_MESSAGE: &str = "An error occurred while processing your request";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    MissingField(String),
    ValidationError {
        message: String,
        field: Option<String>,
    },
    InvalidRating {
        min: i64,
        max: i64,
    },
    InvalidId(String),
    InvalidJson(String),
    IncorrectPassword,

    // 401 Unauthorized
    MissingCredential,
    MalformedCredential,
    InvalidToken(String),
    Unauthenticated,

    // 403 Forbidden
    InvalidCredentials,
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    EmailExists,
    UsernameExists,
    LastAdminViolation,
    SelfModificationForbidden(String),

    // 500 Internal Server Error (detail is logged, never returned)
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingField(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidRating { .. } => 400,
            ApiError::InvalidId(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::IncorrectPassword => 400,
            ApiError::MissingCredential => 401,
            ApiError::MalformedCredential => 401,
            ApiError::InvalidToken(_) => 401,
            ApiError::Unauthenticated => 401,
            ApiError::InvalidCredentials => 403,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::EmailExists => 409,
            ApiError::UsernameExists => 409,
            ApiError::LastAdminViolation => 409,
            ApiError::SelfModificationForbidden(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::MissingField(field) => format!("Missing required field '{}'", field),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::InvalidRating { min, max } => format!("Rating must be between {} and {}", min, max),
            ApiError::InvalidId(what) => format!("Invalid {}", what),
            ApiError::InvalidJson(msg) => msg.clone(),
            ApiError::IncorrectPassword => "Incorrect current password".to_string(),
            ApiError::MissingCredential => "Authorization header missing".to_string(),
            ApiError::MalformedCredential => "Malformed authorization header".to_string(),
            ApiError::InvalidToken(msg) => msg.clone(),
            ApiError::Unauthenticated => "User not authenticated".to_string(),
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            ApiError::Forbidden(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::EmailExists => "Email already in use".to_string(),
            ApiError::UsernameExists => "Username already in use".to_string(),
            ApiError::LastAdminViolation => "Cannot remove the last admin".to_string(),
            ApiError::SelfModificationForbidden(msg) => msg.clone(),
            ApiError::InternalServerError(_) => INTERNAL_MESSAGE.to_string(),
            ApiError::ServiceUnavailable(msg) => msg.clone(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) => "MISSING_FIELD",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidRating { .. } => "INVALID_RATING",
            ApiError::InvalidId(_) => "INVALID_ID",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::IncorrectPassword => "INCORRECT_PASSWORD",
            ApiError::MissingCredential => "MISSING_CREDENTIAL",
            ApiError::MalformedCredential => "MALFORMED_CREDENTIAL",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::EmailExists => "EMAIL_EXISTS",
            ApiError::UsernameExists => "USERNAME_EXISTS",
            ApiError::LastAdminViolation => "LAST_ADMIN_VIOLATION",
            ApiError::SelfModificationForbidden(_) => "SELF_MODIFICATION_FORBIDDEN",
            ApiError::InternalServerError(_) => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "code": self.error_code(),
            "message": self.message(),
        });

        match self {
            ApiError::MissingField(field) => body["field"] = json!(field),
            ApiError::ValidationError { field: Some(field), .. } => body["field"] = json!(field),
            ApiError::InvalidRating { .. } => body["field"] = json!("rating"),
            _ => {}
        }

        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        ApiError::MissingField(field.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn invalid_id(what: impl Into<String>) -> Self {
        ApiError::InvalidId(what.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn self_modification(message: impl Into<String>) -> Self {
        ApiError::SelfModificationForbidden(message.into())
    }

    /// Logs the detail and returns an error whose response hides it.
    pub fn internal(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!("internal error: {}", detail);
        ApiError::InternalServerError(detail)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) if field == "email" => ApiError::EmailExists,
            StoreError::Duplicate(field) if field == "username" => ApiError::UsernameExists,
            StoreError::Duplicate(field) => ApiError::validation(format!("Duplicate value for '{}'", field)),
            StoreError::MissingReference(what) => ApiError::not_found(format!("{} not found", what)),
            StoreError::Corrupt(msg) => ApiError::internal(format!("corrupt record: {}", msg)),
            StoreError::Database(e) => ApiError::internal(format!("database error: {}", e)),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::InvalidToken("Token expired".to_string()),
            TokenError::Invalid(_) => ApiError::InvalidToken("Invalid token".to_string()),
            TokenError::InvalidSecret | TokenError::Generation(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_their_detail() {
        let err = ApiError::internal("connection reset by peer at 10.0.0.3");
        let body = err.to_json();

        assert_eq!(err.status_code(), 500);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn body_carries_code_separate_from_message() {
        let body = ApiError::InvalidRating { min: 1, max: 5 }.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_RATING");
        assert_eq!(body["message"], "Rating must be between 1 and 5");
        assert_eq!(body["field"], "rating");
    }

    #[test]
    fn duplicate_store_errors_map_to_conflicts() {
        let email: ApiError = StoreError::Duplicate("email".to_string()).into();
        let username: ApiError = StoreError::Duplicate("username".to_string()).into();

        assert_eq!(email.error_code(), "EMAIL_EXISTS");
        assert_eq!(username.error_code(), "USERNAME_EXISTS");
        assert_eq!(email.status_code(), 409);
    }

    #[test]
    fn token_failures_collapse_to_invalid_token() {
        let expired: ApiError = TokenError::Expired.into();
        let invalid: ApiError = TokenError::Invalid("bad signature".to_string()).into();

        assert_eq!(expired.error_code(), "INVALID_TOKEN");
        assert_eq!(invalid.error_code(), "INVALID_TOKEN");
        assert_eq!(invalid.status_code(), 401);
        assert!(!invalid.message().contains("signature"));
    }
}
