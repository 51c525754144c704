//! Export pipeline: submit → poll → download → reconcile

use catalog_common::config::StoreEndpoint;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::SyncError;
use crate::models::{BulkOperation, BulkOperationStatus};
use crate::services::bulk_poller::{BulkPoller, PollSettings};
use crate::services::bulk_submitter::submit_bulk_export;
use crate::services::record_reconciler::{reconcile, ReconciledCatalog};
use crate::services::result_fetcher::ResultDownloader;
use crate::services::transport::GraphqlTransport;

/// How a pipeline run ended without error
#[derive(Debug)]
pub enum ExportOutcome {
    /// Job finished; catalog may be empty
    Completed {
        operation: BulkOperation,
        catalog: ReconciledCatalog,
    },
    /// Submission did not yield a CREATED job
    NotStarted {
        status: Option<BulkOperationStatus>,
    },
}

pub struct ExportPipeline {
    transport: Arc<dyn GraphqlTransport>,
    downloader: Arc<dyn ResultDownloader>,
    source: StoreEndpoint,
    poll: PollSettings,
    scratch_dir: PathBuf,
}

impl ExportPipeline {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        downloader: Arc<dyn ResultDownloader>,
        source: StoreEndpoint,
        poll: PollSettings,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            transport,
            downloader,
            source,
            poll,
            scratch_dir,
        }
    }

    /// Run one export
    ///
    /// `observer` sees the submitted snapshot and every polled snapshot.
    pub async fn run<F>(
        &self,
        cancel: &CancellationToken,
        mut observer: F,
    ) -> Result<ExportOutcome, SyncError>
    where
        F: FnMut(&BulkOperation) + Send,
    {
        let submitted = tokio::select! {
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            submitted = submit_bulk_export(self.transport.as_ref(), &self.source) => submitted?,
        };

        let operation = match submitted {
            Some(op) if op.status == BulkOperationStatus::Created => op,
            other => {
                let status = other.map(|op| op.status);
                info!(status = ?status, "Bulk export was not started");
                return Ok(ExportOutcome::NotStarted { status });
            }
        };
        observer(&operation);

        let poller = BulkPoller::new(self.transport.clone(), self.source.clone(), self.poll);
        let finished = poller
            .poll_until_terminal(operation, cancel, &mut observer)
            .await?;

        if finished.status.is_failure() {
            return Err(SyncError::JobFailed {
                status: finished.status,
                error_code: finished.error_code.clone(),
            });
        }

        let Some(url) = finished.url.clone() else {
            info!(operation_id = %finished.id, "Bulk export completed without a result file");
            return Ok(ExportOutcome::Completed {
                operation: finished,
                catalog: ReconciledCatalog::default(),
            });
        };

        let scratch = tokio::select! {
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            scratch = self.downloader.download(&url, &self.scratch_dir) => scratch?,
        };

        let reader = scratch.open().await?;
        let catalog = tokio::select! {
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            catalog = reconcile(reader) => catalog?,
        };

        info!(
            operation_id = %finished.id,
            products = catalog.products.len(),
            skipped_lines = catalog.skipped_lines,
            duplicates = catalog.duplicate_products,
            orphans = catalog.orphaned_metafields,
            "Bulk export reconciled"
        );

        Ok(ExportOutcome::Completed {
            operation: finished,
            catalog,
        })
    }
}
