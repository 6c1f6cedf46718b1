//! Domain models for the storefront.
//!
//! These are validated domain types, separate from the database row types
//! in [`crate::db`].

pub mod analytics;
pub mod cart;
pub mod click;
pub mod order;
pub mod product;
pub mod session;
pub mod user;
pub mod wishlist;

pub use analytics::{AnalyticsReport, DailySales};
pub use cart::CartItem;
pub use click::ProductClickCount;
pub use order::{Order, OrderItem, OrderOverview, OrderWithItems};
pub use product::ProductSnapshot;
pub use session::{SessionUser, keys as session_keys};
pub use user::User;
pub use wishlist::WishlistItem;
