//! Bazaar CLI - Database migrations and user moderation.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar-cli migrate
//!
//! # Create a shop account
//! bazaar-cli user create -u jane_doe -e jane@example.com -p 'correct horse'
//!
//! # Deactivate / reactivate an account
//! bazaar-cli user deactivate jane_doe
//! bazaar-cli user activate jane_doe
//!
//! # List accounts
//! bazaar-cli user list
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user` - Create, list, activate, and deactivate shop accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage shop accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new shop account
    Create {
        /// Username (3-32 letters, digits, `_`, `-`, `.`)
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Reactivate an account
    Activate {
        /// Username of the account
        username: String,
    },
    /// Deactivate an account (existing logins stop working)
    Deactivate {
        /// Username of the account
        username: String,
    },
    /// List all accounts
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), commands::CliError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                password,
            } => {
                commands::user::create(&username, &email, &password).await?;
            }
            UserAction::Activate { username } => {
                commands::user::set_active(&username, true).await?;
            }
            UserAction::Deactivate { username } => {
                commands::user::set_active(&username, false).await?;
            }
            UserAction::List => commands::user::list().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_user_create() {
        let cli = Cli::try_parse_from([
            "bazaar-cli",
            "user",
            "create",
            "-u",
            "jane_doe",
            "-e",
            "jane@example.com",
            "-p",
            "correct horse",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { ref username, .. }
            }) if username == "jane_doe"
        ));
    }

    #[test]
    fn test_deactivate_requires_username() {
        assert!(Cli::try_parse_from(["bazaar-cli", "user", "deactivate"]).is_err());
    }
}
