//! Bulk operation status polling
//!
//! Polls `currentBulkOperation` at a fixed interval until the job reaches a
//! terminal status, the wait budget runs out, or the run is cancelled.

use catalog_common::config::{ExportConfig, StoreEndpoint};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::models::{
    BulkOperation, BulkOperationStatus, CurrentBulkOperationData, GraphqlRequest,
};
use crate::services::transport::{execute, GraphqlTransport};

const CURRENT_BULK_OPERATION_QUERY: &str = r#"query currentBulkOperation {
  currentBulkOperation {
    id
    status
    createdAt
    completedAt
    errorCode
    fileSize
    objectCount
    url
  }
}"#;

/// Poll timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Total time allowed between submission and a terminal status
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(3600),
        }
    }
}

impl From<&ExportConfig> for PollSettings {
    fn from(config: &ExportConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_wait: config.max_wait(),
        }
    }
}

pub struct BulkPoller {
    transport: Arc<dyn GraphqlTransport>,
    source: StoreEndpoint,
    settings: PollSettings,
}

impl BulkPoller {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        source: StoreEndpoint,
        settings: PollSettings,
    ) -> Self {
        Self {
            transport,
            source,
            settings,
        }
    }

    /// Fetch one status snapshot
    pub async fn current(&self) -> Result<BulkOperation, SyncError> {
        let request = GraphqlRequest::new(CURRENT_BULK_OPERATION_QUERY);
        let data: CurrentBulkOperationData =
            execute(self.transport.as_ref(), &self.source, &request).await?;

        data.current_bulk_operation.ok_or_else(|| {
            SyncError::RemoteOperation("no current bulk operation".to_string())
        })
    }

    /// Poll until `initial` (or a later snapshot) is terminal
    ///
    /// Terminal failures are returned as `Ok`; the caller decides how to
    /// report them. `on_snapshot` sees every fresh snapshot.
    pub async fn poll_until_terminal<F>(
        &self,
        initial: BulkOperation,
        cancel: &CancellationToken,
        mut on_snapshot: F,
    ) -> Result<BulkOperation, SyncError>
    where
        F: FnMut(&BulkOperation) + Send,
    {
        let started = Instant::now();
        let mut current = initial;

        loop {
            if current.status.is_terminal() {
                return Ok(current);
            }

            if current.status == BulkOperationStatus::Unknown {
                warn!(operation_id = %current.id, "Unrecognized bulk operation status, continuing to poll");
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                _ = sleep(self.settings.interval) => {}
            }

            if started.elapsed() >= self.settings.max_wait {
                return Err(SyncError::Timeout(self.settings.max_wait));
            }

            let snapshot = tokio::select! {
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                snapshot = self.current() => snapshot?,
            };

            if snapshot.id != current.id {
                warn!(
                    expected = %current.id,
                    actual = %snapshot.id,
                    "Current bulk operation changed while polling"
                );
            }

            debug!(
                operation_id = %snapshot.id,
                status = snapshot.status.as_str(),
                object_count = ?snapshot.object_count,
                "Bulk operation status"
            );

            on_snapshot(&snapshot);
            current = snapshot;
        }
    }
}
