//! Order history route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::OrderWithItems;
use crate::state::AppState;

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub orders: Vec<OrderWithItems>,
}

/// Display all of the caller's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id, None)
        .await?;
    Ok(OrdersTemplate { orders })
}
