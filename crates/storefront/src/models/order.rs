//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::{OrderId, OrderItemId, OrderStatus, PaymentMode, Price, ProductId, UserId};

/// A placed order. Only `status` changes after creation.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_mode: PaymentMode,
    pub created_at: DateTime<Utc>,
}

/// A line of an order, copied from a cart item at checkout. Immutable.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    /// Sum of the line prices.
    #[must_use]
    pub fn total(&self) -> Price {
        Price::total(self.items.iter().map(|item| &item.price))
    }
}

/// One row of the admin order table.
///
/// `total` is a plain sum and may exceed [`Price::MAX`].
#[derive(Debug, Clone, Serialize)]
pub struct OrderOverview {
    pub id: OrderId,
    pub username: String,
    pub status: OrderStatus,
    pub payment_mode: PaymentMode,
    pub item_count: i64,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(order_id: OrderId, product: i64, price: &str) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(product),
            order_id,
            product_id: ProductId::new(product),
            title: format!("Product {product}"),
            price: Price::parse(price).unwrap(),
            image: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_total_sums_items() {
        let order_id = OrderId::new(1);
        let order = OrderWithItems {
            order: Order {
                id: order_id,
                user_id: UserId::new(7),
                status: OrderStatus::Placed,
                payment_mode: PaymentMode::Cod,
                created_at: Utc::now(),
            },
            items: vec![item(order_id, 1, "19.99"), item(order_id, 2, "0.01")],
        };
        assert_eq!(order.total().to_string(), "20.00");
    }

    #[test]
    fn test_order_serializes_flat() {
        let order = OrderWithItems {
            order: Order {
                id: OrderId::new(3),
                user_id: UserId::new(7),
                status: OrderStatus::Shipped,
                payment_mode: PaymentMode::Cod,
                created_at: Utc::now(),
            },
            items: Vec::new(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["status"], "shipped");
        assert_eq!(json["payment_mode"], "cod");
        assert!(json["items"].as_array().unwrap().is_empty());
    }
}
