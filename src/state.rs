use std::sync::Arc;

use thiserror::Error;

use crate::auth::{PasswordError, PasswordHasher, TokenCodec, TokenError};
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{AccountService, CatalogService, ReviewService, UserService};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Token codec: {0}")]
    Token(#[from] TokenError),

    #[error("Password hasher: {0}")]
    Password(#[from] PasswordError),
}

/// Shared, read-only application state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenCodec>,
    pub hasher: PasswordHasher,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, StateError> {
        let tokens = TokenCodec::new(&config.security.token_secret)?;
        let hasher = PasswordHasher::new(
            config.security.password_hash_memory_kib,
            config.security.password_hash_iterations,
        )?;

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            hasher,
            store,
        })
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.store.clone(), self.tokens.clone(), self.hasher.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.store.clone(), self.hasher.clone())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.store.clone())
    }

    pub fn reviews(&self) -> ReviewService {
        ReviewService::new(self.store.clone())
    }
}
