use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Signing secret used when none is configured. Only accepted in development.
pub const DEVELOPMENT_TOKEN_SECRET: &str = "music-review-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. `None` selects the in-memory store (development only).
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub token_secret: String,
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TOKEN_SECRET must not be empty")]
    EmptyTokenSecret,

    #[error("TOKEN_SECRET must be set outside development")]
    DevelopmentSecretInUse,

    #[error("DATABASE_URL must be set outside development")]
    MissingDatabaseUrl,

    #[error("Invalid password hashing parameters: {0}")]
    InvalidHashingParams(String),
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            let v = v.trim().to_string();
            self.database.url = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("TOKEN_SECRET").or_else(|| lookup("JWT_SECRET")) {
            self.security.token_secret = v;
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("PASSWORD_HASH_MEMORY_KIB") {
            self.security.password_hash_memory_kib =
                v.parse().unwrap_or(self.security.password_hash_memory_kib);
        }
        if let Some(v) = lookup("PASSWORD_HASH_ITERATIONS") {
            self.security.password_hash_iterations =
                v.parse().unwrap_or(self.security.password_hash_iterations);
        }

        self
    }

    /// Rejects configurations the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.token_secret.trim().is_empty() {
            return Err(ConfigError::EmptyTokenSecret);
        }
        if self.environment != Environment::Development {
            if self.security.token_secret == DEVELOPMENT_TOKEN_SECRET {
                return Err(ConfigError::DevelopmentSecretInUse);
            }
            if self.database.url.is_none() {
                return Err(ConfigError::MissingDatabaseUrl);
            }
        }
        if self.security.password_hash_memory_kib < 8 || self.security.password_hash_iterations == 0 {
            return Err(ConfigError::InvalidHashingParams(format!(
                "memory {} KiB, {} iterations",
                self.security.password_hash_memory_kib, self.security.password_hash_iterations
            )));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Default `RUST_LOG` directive when the variable is unset
    pub fn default_log_filter(&self) -> &'static str {
        match self.environment {
            Environment::Development => "music_review_api=debug,tower_http=debug,info",
            Environment::Staging => "music_review_api=info,tower_http=info,warn",
            Environment::Production => "music_review_api=info,warn",
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5005,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                token_secret: DEVELOPMENT_TOKEN_SECRET.to_string(),
                password_hash_memory_kib: 19 * 1024,
                password_hash_iterations: 2,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5005,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                token_secret: String::new(),
                password_hash_memory_kib: 19 * 1024,
                password_hash_iterations: 2,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5005,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                token_secret: String::new(),
                password_hash_memory_kib: 19 * 1024,
                password_hash_iterations: 2,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.is_development());
        assert!(config.database.url.is_none());
        assert_eq!(config.security.token_secret, DEVELOPMENT_TOKEN_SECRET);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.validate(), Err(ConfigError::EmptyTokenSecret));
    }

    #[test]
    fn overrides_apply_on_top_of_profile() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://u:p@db/music"),
            ("JWT_SECRET", "s3cret"),
            ("SECURITY_CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]));

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url.as_deref(), Some("postgres://u:p@db/music"));
        assert_eq!(config.security.token_secret, "s3cret");
        assert_eq!(
            config.security.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn token_secret_takes_precedence_over_jwt_secret() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TOKEN_SECRET", "primary"),
            ("JWT_SECRET", "fallback"),
        ]));
        assert_eq!(config.security.token_secret, "primary");
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert_eq!(config.server.port, AppConfig::development().server.port);
    }

    #[test]
    fn production_rejects_development_secret_and_missing_database() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "prod"),
            ("TOKEN_SECRET", DEVELOPMENT_TOKEN_SECRET),
            ("DATABASE_URL", "postgres://db/music"),
        ]));
        assert_eq!(config.validate(), Err(ConfigError::DevelopmentSecretInUse));

        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "staging"),
            ("TOKEN_SECRET", "real-secret"),
        ]));
        assert_eq!(config.validate(), Err(ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn rejects_unusable_hashing_params() {
        let mut config = AppConfig::development();
        config.security.password_hash_iterations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHashingParams(_))));
    }
}
