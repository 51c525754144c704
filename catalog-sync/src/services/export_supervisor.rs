//! Background export supervisor
//!
//! Owns the export run state, the product cache and the cancellation handle
//! of the run in progress. At most one run is active; a finished run can be
//! replaced by starting a new one.

use catalog_common::events::{CatalogEvent, EventBus};
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::SyncError;
use crate::models::{BulkOperation, ExportRun, ExportState, Product};
use crate::services::export_pipeline::{ExportOutcome, ExportPipeline};

/// Snapshot returned by status queries
#[derive(Debug, Clone, Serialize)]
pub struct ExportStatus {
    pub state: ExportState,
    pub run: Option<ExportRun>,
    pub cached_products: usize,
}

#[derive(Default)]
struct SupervisorState {
    /// None until the first run starts
    run: Option<ExportRun>,
    cancel: Option<CancellationToken>,
    products: Arc<Vec<Product>>,
    last_error: Option<String>,
}

#[derive(Clone)]
pub struct ExportSupervisor {
    pipeline: Arc<ExportPipeline>,
    event_bus: EventBus,
    state: Arc<RwLock<SupervisorState>>,
}

impl ExportSupervisor {
    pub fn new(pipeline: ExportPipeline, event_bus: EventBus) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            event_bus,
            state: Arc::new(RwLock::new(SupervisorState::default())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SupervisorState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SupervisorState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a run in the background
    ///
    /// Fails with [`SyncError::AlreadyRunning`] while another run is active.
    pub fn start(&self) -> Result<(ExportRun, JoinHandle<()>), SyncError> {
        let run = ExportRun::new();
        let cancel = CancellationToken::new();

        {
            let mut state = self.write();
            if let Some(current) = state.run.as_ref().filter(|r| !r.is_terminal()) {
                return Err(SyncError::AlreadyRunning(current.run_id));
            }
            state.run = Some(run.clone());
            state.cancel = Some(cancel.clone());
        }

        info!(run_id = %run.run_id, "Export run started");
        self.event_bus.emit_lossy(CatalogEvent::ExportStarted {
            run_id: run.run_id,
            timestamp: run.started_at,
        });

        let supervisor = self.clone();
        let run_id = run.run_id;
        let handle = tokio::spawn(async move {
            supervisor.execute(run_id, cancel).await;
        });

        Ok((run, handle))
    }

    /// Request cancellation of the active run
    ///
    /// Returns `None` when nothing is running.
    pub fn cancel(&self) -> Option<ExportRun> {
        let mut state = self.write();
        let state = &mut *state;

        let run = state.run.as_mut().filter(|r| !r.is_terminal())?;
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        run.transition_to(ExportState::Cancelled);

        info!(run_id = %run.run_id, "Export run cancelled");
        self.event_bus.emit_lossy(CatalogEvent::ExportCancelled {
            run_id: run.run_id,
            timestamp: Utc::now(),
        });

        Some(run.clone())
    }

    pub fn status(&self) -> ExportStatus {
        let state = self.read();
        ExportStatus {
            state: state
                .run
                .as_ref()
                .map(|r| r.state)
                .unwrap_or(ExportState::Idle),
            run: state.run.clone(),
            cached_products: state.products.len(),
        }
    }

    /// Products of the most recent successful run (empty before the first)
    pub fn cached_products(&self) -> Arc<Vec<Product>> {
        self.read().products.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    pub fn is_running(&self) -> bool {
        self.read().run.as_ref().is_some_and(|r| !r.is_terminal())
    }

    async fn execute(&self, run_id: Uuid, cancel: CancellationToken) {
        let observer = {
            let supervisor = self.clone();
            move |operation: &BulkOperation| supervisor.record_snapshot(run_id, operation)
        };

        let result = self.pipeline.run(&cancel, observer).await;
        self.finish(run_id, result);
    }

    fn record_snapshot(&self, run_id: Uuid, operation: &BulkOperation) {
        if let Some(run) = self.write().run.as_mut().filter(|r| r.run_id == run_id) {
            run.record_operation(operation);
        }

        self.event_bus.emit_lossy(CatalogEvent::BulkOperationProgress {
            run_id,
            operation_id: operation.id.clone(),
            status: operation.status.as_str().to_string(),
            object_count: operation.object_count,
            timestamp: Utc::now(),
        });
    }

    fn finish(&self, run_id: Uuid, result: Result<ExportOutcome, SyncError>) {
        let mut guard = self.write();
        let state = &mut *guard;

        let Some(run) = state.run.as_mut().filter(|r| r.run_id == run_id) else {
            return;
        };

        if run.is_terminal() {
            // Cancelled while the pipeline was finishing; keep the old cache
            info!(run_id = %run_id, state = ?run.state, "Discarding result of finished run");
            return;
        }
        state.cancel = None;

        let event = match result {
            Ok(ExportOutcome::Completed { operation, catalog }) => {
                run.record_operation(&operation);
                run.product_count = catalog.products.len();
                run.skipped_lines = catalog.skipped_lines;
                run.orphaned_metafields = catalog.orphaned_metafields;
                run.transition_to(ExportState::Succeeded);

                state.products = Arc::new(catalog.products);
                state.last_error = None;

                info!(
                    run_id = %run_id,
                    products = run.product_count,
                    elapsed_seconds = run.elapsed_seconds(),
                    "Export run succeeded"
                );

                CatalogEvent::ExportCompleted {
                    run_id,
                    product_count: run.product_count,
                    skipped_lines: run.skipped_lines,
                    duration_seconds: run.elapsed_seconds(),
                    timestamp: Utc::now(),
                }
            }
            Ok(ExportOutcome::NotStarted { status }) => {
                let message = format!(
                    "Bulk operation was not started (status: {})",
                    status.map(|s| s.as_str()).unwrap_or("none")
                );
                warn!(run_id = %run_id, "{}", message);
                run.fail(message.clone());
                state.last_error = Some(message.clone());

                CatalogEvent::ExportFailed {
                    run_id,
                    error: message,
                    timestamp: Utc::now(),
                }
            }
            Err(SyncError::Cancelled) => {
                run.transition_to(ExportState::Cancelled);
                CatalogEvent::ExportCancelled {
                    run_id,
                    timestamp: Utc::now(),
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!(run_id = %run_id, error = %message, "Export run failed");
                run.fail(message.clone());
                state.last_error = Some(message.clone());

                CatalogEvent::ExportFailed {
                    run_id,
                    error: message,
                    timestamp: Utc::now(),
                }
            }
        };

        drop(guard);
        self.event_bus.emit_lossy(event);
    }
}
