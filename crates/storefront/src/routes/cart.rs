//! Cart route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::{CartItemId, Price};

use crate::db::CartRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::{CartItem, cart::cart_total};
use crate::routes::{MessageQuery, ProductQuery};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub items: Vec<CartItem>,
    pub total: Price,
    pub msg: Option<String>,
}

/// Display the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = CartRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    let total = cart_total(&items);

    Ok(CartTemplate {
        items,
        total,
        msg: query.msg,
    })
}

/// Cart items as JSON.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn api_index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<CartItem>>, AppError> {
    let items = CartRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(items))
}

/// Add a product to the cart.
///
/// Adding a product that is already in the cart changes nothing.
#[instrument(skip_all, fields(user_id = %user.id, product_id = product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<i64>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Value>, AppError> {
    let product = query.into_snapshot(product_id)?;

    let added = CartRepository::new(state.pool())
        .add(user.id, &product)
        .await?;

    if !added {
        return Ok(Json(json!({ "message": "Already in cart" })));
    }

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.to_string().as_str())]),
    );
    Ok(Json(json!({ "message": "Added to cart!" })))
}

/// Remove one of the caller's cart items.
///
/// Unknown ids and other users' items are ignored.
#[instrument(skip_all, fields(user_id = %user.id, item_id = item_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let removed = CartRepository::new(state.pool())
        .remove(user.id, CartItemId::new(item_id))
        .await?;

    if !removed {
        tracing::debug!("Cart item not found for user");
    }
    Ok(Redirect::to("/cart"))
}
