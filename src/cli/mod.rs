pub mod commands;
pub mod context;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "reviewctl")]
#[command(about = "reviewctl - Administrative tooling for the music review API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create an account with the admin role")]
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    #[command(about = "Grant the admin role to an existing account")]
    Promote {
        #[arg(help = "Email of the account to promote")]
        email: String,
    },

    #[command(about = "List all accounts")]
    Users,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => commands::accounts::create_admin(username, email, password, output_format).await,
        Commands::Promote { email } => commands::accounts::promote(email, output_format).await,
        Commands::Users => commands::accounts::list(output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_admin() {
        let cli = Cli::parse_from([
            "reviewctl",
            "create-admin",
            "--username",
            "root",
            "--email",
            "root@example.com",
            "--password",
            "secret",
        ]);
        match cli.command {
            Commands::CreateAdmin { username, email, .. } => {
                assert_eq!(username, "root");
                assert_eq!(email, "root@example.com");
            }
            _ => panic!("expected create-admin"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::parse_from(["reviewctl", "users", "--json"]);
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Users));
    }

    #[test]
    fn promote_requires_an_email() {
        assert!(Cli::try_parse_from(["reviewctl", "promote"]).is_err());
    }
}
