//! Admin panel route handlers.
//!
//! Every handler is gated on the admin role in the access token: pages and
//! form posts through [`RequireAdmin`], JSON through [`RequireAdminApi`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{OrderId, OrderStatus, UserId};

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, RequireAdminApi};
use crate::models::{AnalyticsReport, OrderOverview, User};
use crate::routes::{MessageQuery, redirect_with_msg};
use crate::services::AnalyticsService;
use crate::state::AppState;

/// Orders listed on the admin dashboard.
const RECENT_ORDER_LIMIT: i64 = 10;

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub admin_name: String,
    pub user_count: i64,
    pub order_count: i64,
    pub recent_orders: Vec<OrderOverview>,
    pub statuses: &'static [OrderStatus],
    pub msg: Option<String>,
}

/// User management template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub users: Vec<User>,
    pub msg: Option<String>,
}

/// Analytics page template; the numbers load from `/admin/analytics/data`.
#[derive(Template, WebTemplate)]
#[template(path = "admin/analytics.html")]
pub struct AdminAnalyticsTemplate;

// =============================================================================
// Form Types
// =============================================================================

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    pub status: String,
}

// =============================================================================
// Pages
// =============================================================================

/// Display user/order counts and the most recent orders.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pool = state.pool();
    let orders = OrderRepository::new(pool);

    let user_count = UserRepository::new(pool).count().await?;
    let order_count = orders.count_all().await?;
    let recent_orders = orders.recent_overview(RECENT_ORDER_LIMIT).await?;

    Ok(AdminDashboardTemplate {
        admin_name: claims.sub,
        user_count,
        order_count,
        recent_orders,
        statuses: &OrderStatus::ALL,
        msg: query.msg,
    })
}

/// List every account.
#[instrument(skip_all)]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(AdminUsersTemplate {
        users,
        msg: query.msg,
    })
}

/// Display the analytics page.
pub async fn analytics_page(RequireAdmin(_claims): RequireAdmin) -> impl IntoResponse {
    AdminAnalyticsTemplate
}

/// Analytics numbers as JSON.
#[instrument(skip_all)]
pub async fn analytics_data(
    State(state): State<AppState>,
    RequireAdminApi(_claims): RequireAdminApi,
) -> Result<Json<AnalyticsReport>, AppError> {
    let report = AnalyticsService::new(state.pool())
        .report(Utc::now())
        .await?;
    Ok(Json(report))
}

// =============================================================================
// Actions
// =============================================================================

/// Reactivate an account. Activating an active account changes nothing.
#[instrument(skip_all, fields(user_id = user_id))]
pub async fn activate(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    set_active(&state, &claims.sub, UserId::new(user_id), true).await
}

/// Deactivate an account. Existing tokens stop working on the next request.
#[instrument(skip_all, fields(user_id = user_id))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    set_active(&state, &claims.sub, UserId::new(user_id), false).await
}

async fn set_active(
    state: &AppState,
    admin: &str,
    user_id: UserId,
    active: bool,
) -> Result<Response, AppError> {
    match UserRepository::new(state.pool())
        .set_active(user_id, active)
        .await
    {
        Ok(user) => {
            tracing::info!(
                admin,
                user_id = %user.id,
                active,
                "Account activation changed"
            );
            Ok(Redirect::to("/admin/users").into_response())
        }
        Err(RepositoryError::NotFound) => {
            Ok(redirect_with_msg("/admin/users", "User not found").into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Set an order's status.
#[instrument(skip_all, fields(order_id = order_id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(order_id): Path<i64>,
    Form(form): Form<OrderStatusForm>,
) -> Result<Response, AppError> {
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        return Ok(redirect_with_msg("/admin/dashboard", "Unknown order status").into_response());
    };

    match OrderRepository::new(state.pool())
        .set_status(OrderId::new(order_id), status)
        .await
    {
        Ok(order) => {
            tracing::info!(
                admin = %claims.sub,
                order_id = %order.id,
                status = %order.status,
                "Order status changed"
            );
            Ok(Redirect::to("/admin/dashboard").into_response())
        }
        Err(RepositoryError::NotFound) => {
            Ok(redirect_with_msg("/admin/dashboard", "Order not found").into_response())
        }
        Err(RepositoryError::Conflict(msg)) => {
            Ok(redirect_with_msg("/admin/dashboard", &msg).into_response())
        }
        Err(err) => Err(err.into()),
    }
}
