//! User dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::{CartRepository, OrderRepository, WishlistRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::{OrderWithItems, User};
use crate::state::AppState;

/// Orders shown on the dashboard.
const RECENT_ORDER_LIMIT: i64 = 5;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: User,
    pub order_count: i64,
    pub wishlist_count: i64,
    pub cart_count: i64,
    pub recent_orders: Vec<OrderWithItems>,
}

/// Display the account overview.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, AppError> {
    let pool = state.pool();
    let orders = OrderRepository::new(pool);

    let order_count = orders.count_for_user(user.id).await?;
    let recent_orders = orders
        .list_for_user(user.id, Some(RECENT_ORDER_LIMIT))
        .await?;
    let wishlist_count = WishlistRepository::new(pool).count_for_user(user.id).await?;
    let cart_count = CartRepository::new(pool).count_for_user(user.id).await?;

    Ok(DashboardTemplate {
        user,
        order_count,
        wishlist_count,
        cart_count,
        recent_orders,
    })
}
