//! Core types for Bazaar.
//!
//! Type-safe wrappers for the domain concepts shared by the shop and its tools.

pub mod email;
pub mod id;
pub mod price;
pub mod status;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use status::*;
pub use username::{Username, UsernameError};
