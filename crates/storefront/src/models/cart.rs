//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{CartItemId, Price, ProductId, UserId};

/// A product waiting in a user's cart. At most one per (user, product).
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Sum of the item prices.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Price {
    Price::total(items.iter().map(|item| &item.price))
}
