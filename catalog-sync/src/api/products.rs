//! Product endpoints
//!
//! GET /products (live query), GET /cached-products (last export)

use axum::{extract::State, routing::get, Json, Router};

use crate::error::ApiResult;
use crate::models::Product;
use crate::services::{fetch_recent_products, ProductEdge};
use crate::AppState;

/// Number of products returned by the live query
const LIVE_PRODUCT_COUNT: u32 = 3;

/// GET /products
///
/// Queries the source store directly and returns the `edges` array.
pub async fn live_products(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductEdge>>> {
    let edges = fetch_recent_products(
        state.transport.as_ref(),
        &state.config.source,
        LIVE_PRODUCT_COUNT,
    )
    .await?;

    tracing::debug!(count = edges.len(), "Live product query");
    Ok(Json(edges))
}

/// GET /cached-products
pub async fn cached_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.exports.cached_products().as_ref().clone())
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(live_products))
        .route("/cached-products", get(cached_products))
}
