//! Export run control
//!
//! POST /export/start, GET /export/status, POST /export/cancel

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::{ApiError, ApiResult};
use crate::models::ExportRun;
use crate::services::ExportStatus;
use crate::AppState;

/// POST /export/start
///
/// Returns 202 Accepted with the new run; 409 if a run is in progress.
pub async fn start_export(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<ExportRun>)> {
    let (run, _handle) = state.exports.start()?;
    Ok((StatusCode::ACCEPTED, Json(run)))
}

/// GET /export/status
pub async fn export_status(State(state): State<AppState>) -> Json<ExportStatus> {
    Json(state.exports.status())
}

/// POST /export/cancel
pub async fn cancel_export(State(state): State<AppState>) -> ApiResult<Json<ExportRun>> {
    state
        .exports
        .cancel()
        .map(Json)
        .ok_or_else(|| ApiError::BadRequest("No export run in progress".to_string()))
}

pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/export/start", post(start_export))
        .route("/export/status", get(export_status))
        .route("/export/cancel", post(cancel_export))
}
