//! Cash-on-delivery checkout route handler.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::routes::redirect_with_msg;
use crate::services::{CheckoutError, CheckoutService};
use crate::state::AppState;

/// Turn the caller's cart into a COD order.
///
/// An empty cart creates nothing and goes back to the cart page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn cod_checkout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response, AppError> {
    match CheckoutService::new(state.pool()).place_cod_order(user.id).await {
        Ok(placed) => {
            add_breadcrumb(
                "checkout",
                "Placed COD order",
                Some(&[("order_id", placed.order.id.to_string().as_str())]),
            );
            Ok(Redirect::to("/orders").into_response())
        }
        Err(CheckoutError::EmptyCart) => {
            Ok(redirect_with_msg("/cart", "Your cart is empty").into_response())
        }
        Err(err) => Err(err.into()),
    }
}
