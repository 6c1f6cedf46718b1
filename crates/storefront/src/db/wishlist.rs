//! Wishlist repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{Price, ProductId, UserId, WishlistItemId};

use super::RepositoryError;
use crate::models::{ProductSnapshot, WishlistItem};

#[derive(Debug, sqlx::FromRow)]
struct WishlistItemRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    title: String,
    price: Decimal,
    image_url: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<WishlistItemRow> for WishlistItem {
    type Error = RepositoryError;

    fn try_from(row: WishlistItemRow) -> Result<Self, Self::Error> {
        let price =
            Price::new(row.price).map_err(|e| RepositoryError::corrupt("wishlist price", e))?;

        Ok(Self {
            id: WishlistItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            title: row.title,
            price,
            image_url: row.image_url,
            created_at: row.created_at,
        })
    }
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Save a product to the user's wishlist.
    ///
    /// Returns `false` if the product was already saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(user_id = %user_id, product_id = %product.product_id))]
    pub async fn add(
        &self,
        user_id: UserId,
        product: &ProductSnapshot,
    ) -> Result<bool, RepositoryError> {
        let inserted: Option<(i64,)> = sqlx::query_as(
            r"
            INSERT INTO wishlist_items (user_id, product_id, title, price, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id) DO NOTHING
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product.product_id)
        .bind(&product.title)
        .bind(product.price.amount())
        .bind(&product.image)
        .fetch_optional(self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// List the user's wishlist, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistItemRow>(
            r"
            SELECT id, user_id, product_id, title, price, image_url, created_at
            FROM wishlist_items
            WHERE user_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Remove one of the user's wishlist items.
    ///
    /// Returns `false` if no item with that id belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: WishlistItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of items in the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM wishlist_items WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Number of wishlist items across all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wishlist_items")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
