//! Product listing route handlers.
//!
//! Products come from the upstream catalog; nothing is stored locally until a
//! user adds one to their cart or wishlist.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::catalog::CatalogProduct;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products.html")]
pub struct ProductsTemplate {
    pub username: String,
    pub products: Arc<Vec<CatalogProduct>>,
    pub error: Option<String>,
}

/// Display the catalog listing.
///
/// An unreachable catalog renders an empty listing with a notice instead of
/// failing the page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> impl IntoResponse {
    let (products, error) = match state.catalog().products().await {
        Ok(products) => (products, None),
        Err(e) => {
            tracing::warn!(error = %e, "Catalog unavailable");
            (
                Arc::new(Vec::new()),
                Some("Products are unavailable right now. Please try again shortly.".to_string()),
            )
        }
    };

    ProductsTemplate {
        username: user.username.into_inner(),
        products,
        error,
    }
}

/// Catalog proxy: the first page of products as JSON.
#[instrument(skip_all)]
pub async fn api_index(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = state.catalog().products().await?;
    Ok(Json(products.as_slice()).into_response())
}
