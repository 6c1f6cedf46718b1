//! Product click tracking route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::db::ClickRepository;
use crate::error::AppError;
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::ProductClickCount;
use crate::state::AppState;

/// Products returned by `/top-clicked`.
const TOP_CLICKED_LIMIT: i64 = 10;

/// Body of `POST /track-click`.
#[derive(Debug, Deserialize)]
pub struct TrackClick {
    pub product_id: Option<i64>,
}

/// Record a product click, attributed to the caller when logged in.
#[instrument(skip_all)]
pub async fn track(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(body): Json<TrackClick>,
) -> Result<Json<Value>, AppError> {
    let product_id = body
        .product_id
        .map(ProductId::new)
        .ok_or_else(|| AppError::BadRequest("Missing product_id".to_string()))?;

    ClickRepository::new(state.pool())
        .record(product_id, user.map(|u| u.id))
        .await?;

    Ok(Json(json!({ "message": "Click tracked" })))
}

/// The caller's most clicked product ids, most clicks first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn top_clicked(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<ProductId>>, AppError> {
    let top = ClickRepository::new(state.pool())
        .top_for_user(user.id, TOP_CLICKED_LIMIT)
        .await?;
    Ok(Json(ranked_ids(top)))
}

fn ranked_ids(counts: Vec<ProductClickCount>) -> Vec<ProductId> {
    counts.into_iter().map(|count| count.product_id).collect()
}
