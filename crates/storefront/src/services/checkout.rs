//! Cash-on-delivery checkout.
//!
//! Turns a user's cart into an order in a single transaction:
//!
//! 1. lock the user's cart rows (`SELECT ... FOR UPDATE`)
//! 2. insert a `Placed` COD order
//! 3. copy each locked row into `order_items`
//! 4. delete exactly the locked rows
//!
//! Either all four steps commit or none do. Serialization failures and
//! deadlocks roll back and the whole transaction is retried.

use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{CartItemId, UserId};

use crate::db::{RepositoryError, cart, orders};
use crate::models::OrderWithItems;

/// Attempts before a transient failure is returned to the caller.
pub const MAX_ATTEMPTS: u32 = 3;

const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// `serialization_failure` and `deadlock_detected`.
const RETRYABLE_SQLSTATES: &[&str] = &["40001", "40P01"];

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl CheckoutError {
    /// Whether retrying the whole transaction may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        let Self::Repository(RepositoryError::Database(sqlx::Error::Database(db_err))) = self
        else {
            return false;
        };
        db_err.code().is_some_and(|code| is_retryable_sqlstate(&code))
    }
}

fn is_retryable_sqlstate(code: &str) -> bool {
    RETRYABLE_SQLSTATES.contains(&code)
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place a COD order for everything in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no items (no order
    /// is created), or `CheckoutError::Repository` if the transaction fails
    /// after [`MAX_ATTEMPTS`] attempts.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn place_cod_order(&self, user_id: UserId) -> Result<OrderWithItems, CheckoutError> {
        let mut attempt = 1;
        loop {
            match self.try_place_order(user_id).await {
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, error = %err, "Checkout conflict, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_place_order(&self, user_id: UserId) -> Result<OrderWithItems, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let cart_items = cart::lock_for_user(&mut tx, user_id).await?;
        if cart_items.is_empty() {
            tx.rollback().await?;
            return Err(CheckoutError::EmptyCart);
        }

        let order = orders::insert_order(&mut tx, user_id).await?;
        let items = orders::insert_items(&mut tx, order.id, &cart_items).await?;

        let locked_ids: Vec<CartItemId> = cart_items.iter().map(|item| item.id).collect();
        let deleted = cart::delete_items(&mut tx, user_id, &locked_ids).await?;
        if deleted != locked_ids.len() as u64 {
            return Err(CheckoutError::Repository(RepositoryError::DataCorruption(
                format!("expected to clear {} cart rows, cleared {deleted}", locked_ids.len()),
            )));
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            item_count = items.len(),
            "COD order placed"
        );

        Ok(OrderWithItems { order, items })
    }
}
