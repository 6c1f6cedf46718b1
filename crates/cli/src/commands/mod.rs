//! CLI command implementations.

pub mod migrate;
pub mod user;

use sqlx::PgPool;
use thiserror::Error;

use bazaar_storefront::config::{ConfigError, database_url_from_env};
use bazaar_storefront::db::{RepositoryError, create_pool};
use bazaar_storefront::services::AuthError;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or invalid environment configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Account creation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Repository error.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// No account with that username.
    #[error("no user named {0}")]
    UserNotFound(String),
}

/// Connect to the shop database named by the environment.
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    Ok(create_pool(&database_url).await?)
}
