//! Product details captured when an item is saved.

use bazaar_core::{Price, ProductId};

/// The catalog fields copied into cart, wishlist, and order rows.
///
/// The catalog is external and may change; these rows keep what the shopper
/// saw when they saved the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
}
