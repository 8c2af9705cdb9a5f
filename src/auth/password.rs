use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
};
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Hashing task failed: {0}")]
    Task(String),
}

/// Argon2id hasher with a fresh random salt per password.
///
/// Hashes are PHC strings, so verification reads the cost parameters back out of the stored
/// hash and keeps working after the configured cost changes.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a throwaway secret at the configured cost, verified against when no
    /// account matches so both login failures pay the same price.
    decoy: Arc<str>,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let mut hasher = Self {
            params,
            decoy: Arc::from(""),
        };
        hasher.decoy = Arc::from(hasher.hash("decoy-password-never-matches")?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    pub fn verify(&self, plain: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        Ok(self.argon2().verify_password(plain.as_bytes(), &parsed).is_ok())
    }

    /// Runs `hash` on the blocking pool so request workers keep serving while Argon2 grinds.
    pub async fn hash_blocking(&self, plain: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    pub async fn verify_blocking(&self, plain: String, stored_hash: String) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &stored_hash))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Full-cost verification against the decoy hash; the outcome is always a mismatch.
    pub async fn verify_decoy_blocking(&self, plain: String) -> Result<(), PasswordError> {
        self.verify_blocking(plain, self.decoy.to_string()).await?;
        Ok(())
    }
}
