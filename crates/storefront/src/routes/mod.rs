//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Database readiness check
//!
//! # Auth
//! GET  /login                      - Login page (?msg, ?error)
//! POST /login                      - Login action, sets access_token cookie
//! GET  /register                   - Register page
//! POST /register                   - Register action
//! GET  /logout                     - Logout
//! POST /logout                     - Logout
//!
//! # Shopping (requires user)
//! GET  /dashboard                  - Account overview
//! GET  /products                   - Catalog listing
//! GET  /cart                       - Cart page
//! POST /add-to-cart/{product_id}   - Add to cart (?title, ?price, ?image)
//! POST /cart/remove/{item_id}      - Remove cart item
//! GET  /wishlist                   - Wishlist page
//! POST /add-to-wishlist/{product_id} - Add to wishlist
//! POST /wishlist/remove/{item_id}  - Remove wishlist item (JSON)
//! POST /cod-checkout               - Place COD order from cart
//! GET  /orders                     - Order history
//! GET  /top-clicked                - This user's most clicked products
//!
//! # Clicks
//! POST /track-click                - Record a product click (user optional)
//!
//! # JSON API
//! GET  /api/products               - Catalog proxy
//! GET  /api/cart                   - Cart items (requires user)
//! GET  /api/wishlist               - Wishlist items (requires user)
//!
//! # Admin (requires admin token)
//! GET  /admin/dashboard            - Counts and recent orders
//! GET  /admin/users                - User list
//! POST /admin/activate/{user_id}   - Activate account
//! POST /admin/deactivate/{user_id} - Deactivate account
//! POST /admin/orders/{order_id}/status - Set order status
//! GET  /admin/analytics            - Analytics page
//! GET  /admin/analytics/data       - Analytics JSON
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod clicks;
pub mod dashboard;
pub mod health;
pub mod home;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use bazaar_core::{Price, ProductId};

use crate::error::AppError;
use crate::models::ProductSnapshot;
use crate::state::AppState;

// =============================================================================
// Shared Query Types
// =============================================================================

/// Flash-style messages carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub msg: Option<String>,
    pub error: Option<String>,
}

/// Product details sent with add-to-cart and add-to-wishlist.
///
/// The catalog is not stored locally, so the client supplies the listing it
/// saw and the row keeps a snapshot of it.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub title: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
}

impl ProductQuery {
    /// Validate into a snapshot of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if a field is missing or blank, or the
    /// price is not a non-negative number.
    pub fn into_snapshot(self, product_id: i64) -> Result<ProductSnapshot, AppError> {
        let title = required(self.title, "title")?;
        let price = required(self.price, "price")?;
        let image = required(self.image, "image")?;

        let price = Price::parse(&price)
            .map_err(|e| AppError::BadRequest(format!("Invalid price: {e}")))?;

        Ok(ProductSnapshot {
            product_id: ProductId::new(product_id),
            title,
            price,
            image,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing query parameter: {name}")))
}

/// 303 redirect to `path` with a `msg` query parameter.
#[must_use]
pub fn redirect_with_msg(path: &str, msg: &str) -> Redirect {
    Redirect::to(&format!("{path}?msg={}", urlencoding::encode(msg)))
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout).post(auth::logout))
}

/// Create the shopping routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .route("/products", get(products::index))
        .route("/cart", get(cart::show))
        .route("/add-to-cart/{product_id}", post(cart::add))
        .route("/cart/remove/{item_id}", post(cart::remove))
        .route("/wishlist", get(wishlist::show))
        .route("/add-to-wishlist/{product_id}", post(wishlist::add))
        .route("/wishlist/remove/{item_id}", post(wishlist::remove))
        .route("/cod-checkout", post(checkout::cod_checkout))
        .route("/orders", get(orders::index))
        .route("/track-click", post(clicks::track))
        .route("/top-clicked", get(clicks::top_clicked))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::api_index))
        .route("/cart", get(cart::api_index))
        .route("/wishlist", get(wishlist::api_index))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::users))
        .route("/activate/{user_id}", post(admin::activate))
        .route("/deactivate/{user_id}", post(admin::deactivate))
        .route("/orders/{order_id}/status", post(admin::update_order_status))
        .route("/analytics", get(admin::analytics_page))
        .route("/analytics/data", get(admin::analytics_data))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .merge(shop_routes())
        .nest("/api", api_routes())
        .nest("/admin", admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header::LOCATION};
    use axum::response::IntoResponse;

    use super::*;

    fn query(title: &str, price: &str, image: &str) -> ProductQuery {
        ProductQuery {
            title: Some(title.to_string()),
            price: Some(price.to_string()),
            image: Some(image.to_string()),
        }
    }

    #[test]
    fn test_snapshot_from_complete_query() {
        let snapshot = query(" Mascara ", "9.99", "https://cdn.example.com/1.png")
            .into_snapshot(1)
            .unwrap();
        assert_eq!(snapshot.product_id, ProductId::new(1));
        assert_eq!(snapshot.title, "Mascara");
        assert_eq!(snapshot.price.to_string(), "9.99");
    }

    #[test]
    fn test_snapshot_rejects_missing_or_blank_fields() {
        let missing = ProductQuery {
            title: Some("Mascara".to_string()),
            price: None,
            image: Some("x.png".to_string()),
        };
        assert!(matches!(
            missing.into_snapshot(1),
            Err(AppError::BadRequest(_))
        ));

        assert!(matches!(
            query("   ", "9.99", "x.png").into_snapshot(1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_snapshot_rejects_bad_prices() {
        assert!(matches!(
            query("Mascara", "cheap", "x.png").into_snapshot(1),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query("Mascara", "-1", "x.png").into_snapshot(1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_redirect_with_msg_encodes_message() {
        let response = redirect_with_msg("/cart", "Your cart is empty").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/cart?msg=Your%20cart%20is%20empty"
        );
    }
}
