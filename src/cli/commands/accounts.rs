use anyhow::anyhow;
use serde_json::json;

use crate::cli::context::state;
use crate::cli::utils::{output_success, output_users};
use crate::cli::OutputFormat;
use crate::error::ApiError;
use crate::services::SignupRequest;
use crate::types::Role;

/// Service errors carry a client message and a code; both are useful on a terminal.
fn describe(err: ApiError) -> anyhow::Error {
    anyhow!("{} ({})", err.message(), err.error_code())
}

pub async fn create_admin(
    username: String,
    email: String,
    password: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let state = state().await?;
    let request = SignupRequest {
        username: Some(username),
        email: Some(email),
        password: Some(password),
        avatar: None,
    };

    let admin = state
        .accounts()
        .register(request, Role::Admin)
        .await
        .map_err(describe)?;

    output_success(
        &output_format,
        &format!("Admin '{}' created", admin.username),
        Some(json!({ "user": admin })),
    )
}

pub async fn promote(email: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = state().await?;
    let user = state.users().promote(&email).await.map_err(describe)?;

    output_success(
        &output_format,
        &format!("'{}' is now an admin", user.username),
        Some(json!({ "user": user })),
    )
}

pub async fn list(output_format: OutputFormat) -> anyhow::Result<()> {
    let state = state().await?;
    let users = state.users().list().await.map_err(describe)?;
    output_users(&output_format, &users)
}
