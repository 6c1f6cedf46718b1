//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::WishlistItemId;

use crate::db::WishlistRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::WishlistItem;
use crate::routes::ProductQuery;
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub items: Vec<WishlistItem>,
}

/// Display the wishlist.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, AppError> {
    let items = WishlistRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(WishlistTemplate { items })
}

/// Wishlist items as JSON.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn api_index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<WishlistItem>>, AppError> {
    let items = WishlistRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(items))
}

/// Save a product to the wishlist. Saving it twice changes nothing.
#[instrument(skip_all, fields(user_id = %user.id, product_id = product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<i64>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Value>, AppError> {
    let product = query.into_snapshot(product_id)?;

    let added = WishlistRepository::new(state.pool())
        .add(user.id, &product)
        .await?;

    if !added {
        return Ok(Json(json!({ "message": "Already in wishlist" })));
    }

    add_breadcrumb(
        "wishlist",
        "Added to wishlist",
        Some(&[("product_id", product_id.to_string().as_str())]),
    );
    Ok(Json(json!({ "message": "Added to wishlist!" })))
}

/// Remove one of the caller's wishlist items.
#[instrument(skip_all, fields(user_id = %user.id, item_id = item_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let removed = WishlistRepository::new(state.pool())
        .remove(user.id, WishlistItemId::new(item_id))
        .await?;

    if !removed {
        return Err(AppError::NotFound("Item not found".to_string()));
    }
    Ok(Json(json!({ "status": "removed" })))
}
