use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore};
use crate::state::AppState;

/// Loads `.env` and the process environment. The CLI always targets a real database.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env();
    if config.database.url.is_none() {
        anyhow::bail!("DATABASE_URL must be set to use reviewctl");
    }
    Ok(config)
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    DatabaseManager::health_check(&pool).await?;
    Ok(pool)
}

/// Application state over Postgres, for commands that go through the services.
pub async fn state() -> anyhow::Result<AppState> {
    let config = load_config()?;
    let pool = connect(&config).await?;
    Ok(AppState::new(config, Arc::new(PgStore::new(pool)))?)
}
