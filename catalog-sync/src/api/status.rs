//! Status probe and health check

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// GET / response
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub id: u32,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Service name ("catalog-sync")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Whether replication to a target store is available
    pub replication_enabled: bool,
    /// Error of the last failed export run, cleared by a successful one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /
pub async fn ready() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        id: 1,
        message: "API ready and waiting".to_string(),
    })
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "catalog-sync".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        replication_enabled: state.replicator.is_some(),
        last_error: state.exports.last_error(),
    })
}

pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ready))
        .route("/health", get(health_check))
}
