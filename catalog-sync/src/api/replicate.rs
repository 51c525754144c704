//! POST /replicate

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Deserialize;
use std::collections::HashSet;

use crate::error::{ApiError, ApiResult};
use crate::models::{Product, ReplicationSummary};
use crate::AppState;

/// POST /replicate request
///
/// An empty body replicates every cached product.
#[derive(Debug, Default, Deserialize)]
pub struct ReplicateRequest {
    #[serde(default)]
    pub product_ids: Option<Vec<String>>,
}

impl ReplicateRequest {
    fn parse(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
    }
}

/// Cached products in cache order, optionally restricted to `ids`
fn select_products(cached: &[Product], ids: Option<&[String]>) -> Vec<Product> {
    match ids {
        None => cached.to_vec(),
        Some(ids) => {
            let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
            cached
                .iter()
                .filter(|p| wanted.contains(p.id.as_str()))
                .cloned()
                .collect()
        }
    }
}

/// POST /replicate
pub async fn replicate(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ReplicationSummary>> {
    let request = ReplicateRequest::parse(&body)?;

    let replicator = state
        .replicator
        .clone()
        .ok_or_else(|| ApiError::BadRequest("No target store configured".to_string()))?;

    let cached = state.exports.cached_products();
    let products = select_products(&cached, request.product_ids.as_deref());

    if let Some(ids) = &request.product_ids {
        if products.len() < ids.len() {
            tracing::warn!(
                requested = ids.len(),
                found = products.len(),
                "Some requested products are not in the cache"
            );
        }
    }

    let summary = replicator.replicate_all(&products, &state.shutdown).await;
    Ok(Json(summary))
}

pub fn replicate_routes() -> Router<AppState> {
    Router::new().route("/replicate", post(replicate))
}
