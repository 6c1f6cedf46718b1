//! Cart repository.
//!
//! Cart rows are unique per (user, product); adding an existing product is a
//! no-op. Every read and delete is scoped by `user_id`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use bazaar_core::{CartItemId, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{CartItem, ProductSnapshot};

const CART_COLUMNS: &str = "id, user_id, product_id, title, price, image, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    title: String,
    price: Decimal,
    image: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| RepositoryError::corrupt("cart price", e))?;

        Ok(Self {
            id: CartItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            title: row.title,
            price,
            image: row.image,
            created_at: row.created_at,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to the user's cart.
    ///
    /// Returns `false` if the product was already in the cart.
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
            INSERT INTO cart_items (user_id, product_id, title, price, image)
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

    /// List the user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Remove one of the user's cart items.
    ///
    /// Returns `false` if no item with that id belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of items in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of cart items across all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction helpers (checkout)
// =============================================================================

/// Read and row-lock the user's cart inside a transaction.
///
/// Concurrent checkouts for the same user block here until the first commits.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
pub async fn lock_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartItemRow>(&format!(
        "SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY created_at, id FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Delete exactly the given cart rows of the user.
///
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn delete_items(
    conn: &mut PgConnection,
    user_id: UserId,
    item_ids: &[CartItemId],
) -> Result<u64, RepositoryError> {
    let ids: Vec<i64> = item_ids.iter().map(CartItemId::as_i64).collect();

    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(&ids)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}
