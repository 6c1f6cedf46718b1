//! Bazaar Core - Shared domain types.
//!
//! Types used by every Bazaar component:
//! - `storefront` - The shop web server (customers and admin panel)
//! - `cli` - Command-line tools for migrations and user moderation
//!
//! # Architecture
//!
//! The core crate contains only types and their validation rules - no I/O, no
//! database access, no HTTP. Database encoding for ids is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, usernames, emails, prices, and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
