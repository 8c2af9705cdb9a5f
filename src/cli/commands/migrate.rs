use serde_json::json;

use crate::cli::context::{connect, load_config};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let pool = connect(&config).await?;

    DatabaseManager::migrate(&pool).await?;

    let target = config
        .database
        .url
        .as_deref()
        .map(DatabaseManager::redact_url)
        .transpose()?
        .unwrap_or_default();
    output_success(
        &output_format,
        "Migrations applied",
        Some(json!({ "database": target })),
    )
}
