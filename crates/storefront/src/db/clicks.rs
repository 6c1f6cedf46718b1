//! Product click log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::ProductClickCount;

#[derive(Debug, sqlx::FromRow)]
struct ClickCountRow {
    product_id: i64,
    clicks: i64,
}

impl From<ClickCountRow> for ProductClickCount {
    fn from(row: ClickCountRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            clicks: row.clicks,
        }
    }
}

/// Repository for click tracking.
pub struct ClickRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClickRepository<'a> {
    /// Create a new click repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a click. `user_id` is `None` for anonymous visitors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn record(
        &self,
        product_id: ProductId,
        user_id: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO product_clicks (product_id, user_id) VALUES ($1, $2)")
            .bind(product_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// The user's most clicked products, most clicks first, ties by product id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<ProductClickCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClickCountRow>(
            r"
            SELECT product_id, COUNT(*) AS clicks
            FROM product_clicks
            WHERE user_id = $1
            GROUP BY product_id
            ORDER BY clicks DESC, product_id ASC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The most clicked products across all visitors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_overall(&self, limit: i64) -> Result<Vec<ProductClickCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClickCountRow>(
            r"
            SELECT product_id, COUNT(*) AS clicks
            FROM product_clicks
            GROUP BY product_id
            ORDER BY clicks DESC, product_id ASC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Clicks recorded at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM product_clicks WHERE clicked_at >= $1")
                .bind(since)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
