//! Shop account commands.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `ADMIN_USERNAME` - Reserved administrator name, refused for new accounts

use bazaar_storefront::config::admin_username_from_env;
use bazaar_storefront::db::{RepositoryError, UserRepository};
use bazaar_storefront::models::User;
use bazaar_storefront::services::register_account;

use super::{CliError, connect};

/// Create a new shop account.
///
/// # Errors
///
/// Returns an error if validation fails, the username or email is taken, or
/// the database is unreachable.
pub async fn create(username: &str, email: &str, password: &str) -> Result<(), CliError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let admin_username = admin_username_from_env();

    let user = register_account(
        &users,
        admin_username.as_deref(),
        username,
        email,
        password,
    )
    .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Email: {}",
        user.id,
        user.username,
        user.email
    );
    Ok(())
}

/// Activate or deactivate an account by username.
///
/// # Errors
///
/// Returns `CliError::UserNotFound` if no account has that username.
pub async fn set_active(username: &str, active: bool) -> Result<(), CliError> {
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_active_by_username(username, active)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::UserNotFound(username.to_owned()),
            other => CliError::Repository(other),
        })?;

    tracing::info!(
        "User {} is now {}",
        user.username,
        if user.is_active { "active" } else { "deactivated" }
    );
    Ok(())
}

/// Print every account, one per line.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), CliError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool).list_all().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:>6}  {:<32}  {:<40}  {:<8}  STATUS", "ID", "USERNAME", "EMAIL", "ACCOUNT");
        for user in &users {
            println!("{}", format_row(user));
        }
        println!("{} user(s)", users.len());
    }
    Ok(())
}

fn format_row(user: &User) -> String {
    format!(
        "{:>6}  {:<32}  {:<40}  {:<8}  {}",
        user.id.as_i64(),
        user.username.as_str(),
        user.email.as_str(),
        user.account_type.as_str(),
        if user.is_active { "active" } else { "deactivated" }
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{AccountType, Email, UserId, Username};
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_format_row() {
        let user = User {
            id: UserId::new(42),
            username: Username::parse("jane_doe").unwrap(),
            email: Email::parse("jane@example.com").unwrap(),
            is_active: false,
            account_type: AccountType::Standard,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let row = format_row(&user);
        assert!(row.starts_with("    42  jane_doe"));
        assert!(row.contains("jane@example.com"));
        assert!(row.ends_with("standard  deactivated"));
    }
}
