//! catalog-sync library interface
//!
//! Exports a product catalog from a source store through its bulk export
//! API, keeps the reconciled products in memory, and replicates them into a
//! target store on request.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, SyncError};

use axum::Router;
use catalog_common::config::TomlConfig;
use catalog_common::events::EventBus;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::services::{
    ExportPipeline, ExportSupervisor, GraphqlTransport, HttpDownloader, HttpTransport,
    PollSettings, Replicator, ResultDownloader,
};

const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TomlConfig>,
    /// Transport used for live queries against the source store
    pub transport: Arc<dyn GraphqlTransport>,
    /// Background export runs and the product cache
    pub exports: ExportSupervisor,
    /// None when no target store is configured
    pub replicator: Option<Arc<Replicator>>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Cancelled on shutdown; stops replication batches in progress
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: TomlConfig,
        transport: Arc<dyn GraphqlTransport>,
        downloader: Arc<dyn ResultDownloader>,
    ) -> Self {
        let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

        let pipeline = ExportPipeline::new(
            transport.clone(),
            downloader,
            config.source.clone(),
            PollSettings::from(&config.export),
            config.scratch_dir(),
        );
        let exports = ExportSupervisor::new(pipeline, event_bus.clone());

        let replicator = config.target.clone().map(|target| {
            Arc::new(Replicator::new(
                transport.clone(),
                target,
                &config.replication,
                event_bus.clone(),
            ))
        });

        Self {
            config: Arc::new(config),
            transport,
            exports,
            replicator,
            event_bus,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
        }
    }

    /// State backed by real HTTP clients
    pub fn from_config(config: TomlConfig) -> Result<Self, SyncError> {
        let transport = Arc::new(HttpTransport::new()?);
        let downloader = Arc::new(HttpDownloader::new()?);
        Ok(Self::new(config, transport, downloader))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::status_routes())
        .merge(api::product_routes())
        .merge(api::export_routes())
        .merge(api::replicate_routes())
        .merge(api::event_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until `signal` resolves
///
/// The shutdown token and any export run are cancelled when the signal fires,
/// before open connections are drained.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let shutdown = state.shutdown.clone();
    let exports = state.exports.clone();
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            shutdown.cancel();
            if exports.cancel().is_some() {
                info!("Cancelled export run in progress");
            }
        })
        .await
}
