//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{AccountType, Email, UserId, Username};

/// A registered shop account.
///
/// The password hash is deliberately absent; it only leaves the database
/// during login verification.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    /// Deactivated accounts cannot log in or use existing tokens.
    pub is_active: bool,
    pub account_type: AccountType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
