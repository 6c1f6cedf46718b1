//! Session-related types.
//!
//! The access token decides who the caller is. The session only mirrors the
//! token's subject and role so templates can greet the user.

use serde::{Deserialize, Serialize};

use bazaar_core::UserRole;

/// Display copy of the logged-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub role: UserRole,
}

/// Session keys.
pub mod keys {
    /// Key for the [`SessionUser`](super::SessionUser) mirror.
    pub const CURRENT_USER: &str = "current_user";
}
