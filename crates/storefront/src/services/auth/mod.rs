//! Authentication service.
//!
//! Password registration and login for shop accounts, plus the built-in
//! administrator configured through the environment.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{Email, UserRole, Username};

use crate::config::AdminCredentials;
use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{SessionUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// Signed access token for the `access_token` cookie.
    pub token: String,
    /// Session mirror of the token's subject and role.
    pub session_user: SessionUser,
}

impl LoginSuccess {
    /// Where the browser goes after logging in.
    #[must_use]
    pub const fn landing_page(&self) -> &'static str {
        match self.session_user.role {
            UserRole::Admin => "/admin/dashboard",
            UserRole::User => "/dashboard",
        }
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    keys: &'a TokenKeys,
    admin: Option<&'a AdminCredentials>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        keys: &'a TokenKeys,
        admin: Option<&'a AdminCredentials>,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            keys,
            admin,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// See [`register_account`].
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let admin_username = self.admin.map(|admin| admin.username.as_str());
        register_account(&self.users, admin_username, username, email, password).await
    }

    /// Log in with username and password and issue an access token.
    ///
    /// The configured administrator is checked first; everyone else is
    /// verified against the stored argon2 hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown username or
    /// wrong password, and `AuthError::AccountDisabled` for a deactivated
    /// account with the right password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let username = username.trim();

        if let Some(admin) = self.admin {
            if admin.username == username
                && secure_compare(password, admin.password.expose_secret())
            {
                tracing::info!("Admin logged in");
                return self.issue(username, UserRole::Admin);
            }
        }

        let (user, password_hash) = self
            .users
            .get_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue(user.username.as_str(), UserRole::User)
    }

    fn issue(&self, subject: &str, role: UserRole) -> Result<LoginSuccess, AuthError> {
        let token = self.keys.issue(subject, role)?;
        Ok(LoginSuccess {
            token,
            session_user: SessionUser {
                username: subject.to_string(),
                role,
            },
        })
    }
}

/// Validate, hash, and store a new account.
///
/// `admin_username` is reserved: registering it (in any letter case) fails
/// like an existing account.
///
/// # Errors
///
/// Returns `AuthError::InvalidUsername` / `InvalidEmail` / `WeakPassword`
/// on bad input, and `AuthError::UserAlreadyExists` if the username or
/// email is taken (or the username is reserved).
#[instrument(skip(users, email, password))]
pub async fn register_account(
    users: &UserRepository<'_>,
    admin_username: Option<&str>,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let username = Username::parse(username)?;
    let email = Email::parse(email)?;
    validate_password(password)?;

    if admin_username.is_some_and(|admin| admin.eq_ignore_ascii_case(username.as_str())) {
        return Err(AuthError::UserAlreadyExists);
    }

    if users.exists(&username, &email).await? {
        return Err(AuthError::UserAlreadyExists);
    }

    let password_hash = hash_password(password)?;

    let user = users
        .create(&username, &email, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(user)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparsable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Compare two secrets without leaking where they differ or their lengths.
fn secure_compare(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
