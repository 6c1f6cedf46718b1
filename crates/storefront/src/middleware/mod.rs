//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is not a layer: handlers opt in through the extractors in
//! [`auth`].

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalUser, RequireAdmin, RequireAdminApi, RequireUser, clear_access_token,
    clear_current_user, current_user, set_access_token, set_current_user,
};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
