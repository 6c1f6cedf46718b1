//! Catalog wire types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::ProductId;

/// A product as listed by the upstream catalog.
///
/// Fields the upstream may omit default to empty values so a sparse listing
/// still renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Listed price, carried as a JSON number on both sides.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CatalogProduct {
    /// Image to show in listings: the thumbnail, else the first gallery image.
    #[must_use]
    pub fn display_image(&self) -> &str {
        if self.thumbnail.is_empty() {
            self.images.first().map_or("", String::as_str)
        } else {
            &self.thumbnail
        }
    }
}

/// Envelope returned by `GET /products`.
#[derive(Debug, Deserialize)]
pub(super) struct ProductPage {
    pub products: Vec<CatalogProduct>,
}
