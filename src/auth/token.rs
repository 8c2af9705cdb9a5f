use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Role;

/// Lifetime of every issued token. There is no refresh; expiry means logging in again.
pub const TOKEN_LIFETIME_HOURS: i64 = 6;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Role, issued_at: DateTime<Utc>) -> Self {
        let exp = (issued_at + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp();
        Self {
            sub: user_id,
            role,
            iat: issued_at.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token signing secret is empty")]
    InvalidSecret,

    #[error("Token generation error: {0}")]
    Generation(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Signs and verifies session tokens with a single process-wide secret.
///
/// The secret comes from configuration at startup and is immutable afterwards.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let mut validation = Validation::new(ALGORITHM);
        // Expiry is exact: a token is dead the second its 6 hours are up.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String, TokenError> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Issues a token as if signed at `issued_at`. Identical inputs produce identical tokens.
    pub fn issue_at(&self, user_id: Uuid, role: Role, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, role, issued_at);
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").field("algorithm", &ALGORITHM).finish()
    }
}
