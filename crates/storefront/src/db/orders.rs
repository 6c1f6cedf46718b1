//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use bazaar_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMode, Price, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::{CartItem, Order, OrderItem, OrderOverview, OrderWithItems};

const ORDER_COLUMNS: &str = "id, user_id, status, payment_mode, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, title, price, image, created_at";

/// Conflict message when a delivered or cancelled order is changed.
const FINAL_ORDER_MESSAGE: &str = "Order is already final";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: String,
    payment_mode: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::corrupt("order status", e))?;
        let payment_mode = row
            .payment_mode
            .parse::<PaymentMode>()
            .map_err(|e| RepositoryError::corrupt("payment mode", e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            status,
            payment_mode,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    title: String,
    price: Decimal,
    image: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let price =
            Price::new(row.price).map_err(|e| RepositoryError::corrupt("order item price", e))?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            title: row.title,
            price,
            image: row.image,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderOverviewRow {
    id: i64,
    username: String,
    status: String,
    payment_mode: String,
    item_count: i64,
    total: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderOverviewRow> for OrderOverview {
    type Error = RepositoryError;

    fn try_from(row: OrderOverviewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            username: row.username,
            status: row
                .status
                .parse()
                .map_err(|e| RepositoryError::corrupt("order status", e))?,
            payment_mode: row
                .payment_mode
                .parse()
                .map_err(|e| RepositoryError::corrupt("payment mode", e))?,
            item_count: row.item_count,
            total: row.total,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's orders with their items, newest first.
    ///
    /// `limit` caps the number of orders returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let item = OrderItem::try_from(row)?;
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }

    /// Number of orders placed by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of orders across all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Most recent orders across all users, for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn recent_overview(&self, limit: i64) -> Result<Vec<OrderOverview>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderOverviewRow>(
            r"
            SELECT o.id, u.username, o.status, o.payment_mode, o.created_at,
                   COUNT(oi.id) AS item_count,
                   COALESCE(SUM(oi.price), 0.00) AS total
            FROM orders o
            JOIN users u ON u.id = o.user_id
            LEFT JOIN order_items oi ON oi.order_id = o.id
            GROUP BY o.id, u.username
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Change an order's status.
    ///
    /// The current row is locked first so a concurrent change cannot slip
    /// past the final-status check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the order is already final.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()?;

        if !current.status.can_transition_to(status) {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(FINAL_ORDER_MESSAGE.to_string()));
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Order items created per UTC day, for days on or after `since`.
    ///
    /// Days without sales are absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn daily_item_counts(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64)>, RepositoryError> {
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) AS sales
            FROM order_items
            WHERE (created_at AT TIME ZONE 'UTC')::DATE >= $1
            GROUP BY day
            ORDER BY day
            ",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Transaction helpers (checkout)
// =============================================================================

/// Insert a new `Placed` COD order for the user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        INSERT INTO orders (user_id, status, payment_mode)
        VALUES ($1, $2, $3)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(OrderStatus::Placed.as_str())
    .bind(PaymentMode::Cod.as_str())
    .fetch_one(conn)
    .await?;

    row.try_into()
}

/// Copy cart items into the order as its lines.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    cart: &[CartItem],
) -> Result<Vec<OrderItem>, RepositoryError> {
    let product_ids: Vec<i64> = cart.iter().map(|item| item.product_id.as_i64()).collect();
    let titles: Vec<&str> = cart.iter().map(|item| item.title.as_str()).collect();
    let prices: Vec<Decimal> = cart.iter().map(|item| item.price.amount()).collect();
    let images: Vec<&str> = cart.iter().map(|item| item.image.as_str()).collect();

    let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
        r"
        INSERT INTO order_items (order_id, product_id, title, price, image)
        SELECT $1, product_id, title, price, image
        FROM UNNEST($2::BIGINT[], $3::TEXT[], $4::NUMERIC[], $5::TEXT[])
            AS cart(product_id, title, price, image)
        RETURNING {ORDER_ITEM_COLUMNS}
        "
    ))
    .bind(order_id)
    .bind(&product_ids)
    .bind(&titles)
    .bind(&prices)
    .bind(&images)
    .fetch_all(conn)
    .await?;

    let mut items = rows
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    items.sort_by_key(|item| item.id);
    Ok(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn overview_row(total: Decimal) -> OrderOverviewRow {
        OrderOverviewRow {
            id: 9,
            username: "alice".to_string(),
            status: "placed".to_string(),
            payment_mode: "cod".to_string(),
            item_count: 2,
            total,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_overview_total_is_not_capped_at_item_limit() {
        let total = Price::MAX.amount() + Price::MAX.amount();
        let overview = OrderOverview::try_from(overview_row(total)).unwrap();
        assert_eq!(overview.total, total);
        assert_eq!(overview.total.to_string(), "19999999999.98");
    }

    #[test]
    fn test_overview_rejects_unknown_status() {
        let mut row = overview_row(Decimal::ZERO);
        row.status = "lost".to_string();
        assert!(matches!(
            OrderOverview::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
