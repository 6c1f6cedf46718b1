//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, and access tokens
//! - `checkout` - Cart to COD order transition
//! - `analytics` - Admin analytics aggregation

pub mod analytics;
pub mod auth;
pub mod checkout;

pub use analytics::AnalyticsService;
pub use auth::{
    AuthError, AuthService, Claims, LoginSuccess, TokenError, TokenKeys, register_account,
};
pub use checkout::{CheckoutError, CheckoutService};
