//! Click tracking aggregates.

use serde::Serialize;

use bazaar_core::ProductId;

/// How many times a product was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductClickCount {
    pub product_id: ProductId,
    pub clicks: i64,
}
