use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::database::models::UserProfile;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(fields)) = data {
                if let Some(object) = response.as_object_mut() {
                    object.extend(fields);
                }
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a list of accounts as a table or a JSON array
pub fn output_users(output_format: &OutputFormat, users: &[UserProfile]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
        }
        OutputFormat::Text => {
            if users.is_empty() {
                println!("No users");
                return Ok(());
            }

            println!("{:<38} {:<20} {:<30} {:<6} {}", "ID", "USERNAME", "EMAIL", "ROLE", "CREATED");
            println!("{}", "-".repeat(110));
            for user in users {
                println!(
                    "{:<38} {:<20} {:<30} {:<6} {}",
                    user.id,
                    user.username,
                    user.email,
                    user.role,
                    user.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
    Ok(())
}
