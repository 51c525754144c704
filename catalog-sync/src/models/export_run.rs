//! Export run state machine
//!
//! IDLE → RUNNING → SUCCEEDED | FAILED | CANCELLED
//!
//! A run is restartable: once terminal, a new run replaces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BulkOperation, BulkOperationStatus};

/// Export run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportState {
    /// No export has run since startup
    Idle,
    /// Submitting, polling, downloading or reconciling
    Running,
    /// Product cache refreshed
    Succeeded,
    /// Run ended with an error; previous cache retained
    Failed,
    /// Run cancelled by operator
    Cancelled,
}

/// One export run (in-memory state)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRun {
    pub run_id: Uuid,
    pub state: ExportState,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Remote bulk operation id, once submitted
    pub operation_id: Option<String>,
    /// Last observed remote status
    pub operation_status: Option<BulkOperationStatus>,
    /// Records written remotely so far
    pub object_count: Option<u64>,

    pub product_count: usize,
    pub skipped_lines: usize,
    pub orphaned_metafields: usize,

    pub error: Option<String>,
}

impl ExportRun {
    /// Create a run in RUNNING state
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: ExportState::Running,
            started_at: Utc::now(),
            ended_at: None,
            operation_id: None,
            operation_status: None,
            object_count: None,
            product_count: 0,
            skipped_lines: 0,
            orphaned_metafields: 0,
            error: None,
        }
    }

    pub fn transition_to(&mut self, new_state: ExportState) {
        self.state = new_state;

        if self.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Record the latest bulk operation snapshot
    pub fn record_operation(&mut self, operation: &BulkOperation) {
        self.operation_id = Some(operation.id.clone());
        self.operation_status = Some(operation.status);
        self.object_count = operation.object_count;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.transition_to(ExportState::Failed);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ExportState::Succeeded | ExportState::Failed | ExportState::Cancelled
        )
    }

    pub fn elapsed_seconds(&self) -> u64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds().max(0) as u64
    }
}

impl Default for ExportRun {
    fn default() -> Self {
        Self::new()
    }
}
