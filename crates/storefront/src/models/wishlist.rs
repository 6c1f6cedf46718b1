//! Wishlist domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Price, ProductId, UserId, WishlistItemId};

/// A saved product. At most one per (user, product); unaffected by checkout.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}
