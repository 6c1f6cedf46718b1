//! Signed access tokens.
//!
//! Tokens are HS256 JSON Web Tokens carried in the `access_token` cookie.
//! Encoding and signature checks go through `jsonwebtoken`; expiry is checked
//! here so it can be evaluated against an explicit clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::UserRole;

/// Default token lifetime.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Errors from issuing or verifying a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not a well-formed HS256 token.
    #[error("malformed token")]
    Malformed,

    /// The signature does not match the header and claims.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// The token could not be signed.
    #[error("token key error: {0}")]
    Key(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed,
        }
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the bearer (the admin username for admin tokens).
    pub sub: String,
    pub role: UserRole,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Whether these claims grant admin access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Signing key and lifetime for access tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    /// Keys with the default one-day lifetime.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    /// Override the token lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a token for `subject` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the claims cannot be signed.
    pub fn issue(&self, subject: &str, role: UserRole) -> Result<String, TokenError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token for `subject` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the claims cannot be signed.
    pub fn issue_at(
        &self,
        subject: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Key(e.to_string()))
    }

    /// Verify a token as of now.
    ///
    /// # Errors
    ///
    /// Returns `Malformed`, `InvalidSignature`, or `Expired`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`.
    ///
    /// Only HS256 is accepted. A token whose `exp` equals `now` is already
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns `Malformed`, `InvalidSignature`, or `Expired`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
