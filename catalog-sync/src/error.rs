//! Error types for catalog-sync
//!
//! [`SyncError`] is the pipeline taxonomy returned by every export and
//! replication stage. [`ApiError`] maps failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::BulkOperationStatus;

/// Export and replication pipeline errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Request construction, connection or body read failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed GraphQL response body
    #[error("Decode error: {0}")]
    Decode(String),

    /// The remote API reported errors inside a successful response
    #[error("Remote operation error: {0}")]
    RemoteOperation(String),

    /// Result file download failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Bulk operation reached a terminal failure state
    #[error("Bulk operation ended with status {} (error code: {})", .status.as_str(), .error_code.as_deref().unwrap_or("none"))]
    JobFailed {
        status: BulkOperationStatus,
        error_code: Option<String>,
    },

    /// Bulk operation did not finish within the wait budget
    #[error("Bulk operation did not finish within {0:?}")]
    Timeout(Duration),

    /// Operator cancelled the run
    #[error("Export cancelled")]
    Cancelled,

    /// Another export run is still in progress
    #[error("Export run {0} is already in progress")]
    AlreadyRunning(Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., export already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream store failure
    #[error(transparent)]
    Sync(SyncError),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::AlreadyRunning(run_id) => {
                ApiError::Conflict(format!("Export run {} is already in progress", run_id))
            }
            other => ApiError::Sync(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Sync(ref err) => {
                let code = match err {
                    SyncError::Transport(_) | SyncError::Fetch(_) => "UPSTREAM_UNAVAILABLE",
                    SyncError::Decode(_) => "UPSTREAM_DECODE_ERROR",
                    SyncError::RemoteOperation(_) => "UPSTREAM_REJECTED",
                    SyncError::Timeout(_) => "UPSTREAM_TIMEOUT",
                    _ => "SYNC_ERROR",
                };
                let status = match err {
                    SyncError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    SyncError::Io(_) | SyncError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, code, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
