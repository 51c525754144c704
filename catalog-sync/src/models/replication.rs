//! Per-product replication outcomes

use serde::{Deserialize, Serialize};

use super::UserError;

/// Result of one product creation call against the target store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationResult {
    /// Identifier of the product in the source store
    pub source_id: String,
    pub title: String,
    #[serde(flatten)]
    pub outcome: ReplicationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplicationOutcome {
    /// Product created; identifier assigned by the target store
    Created { new_id: String },
    /// Target store refused the input
    Rejected { user_errors: Vec<UserError> },
    /// Transport or decode failure
    Failed { error: String },
}

impl ReplicationResult {
    pub fn is_created(&self) -> bool {
        matches!(self.outcome, ReplicationOutcome::Created { .. })
    }

    pub fn new_id(&self) -> Option<&str> {
        match &self.outcome {
            ReplicationOutcome::Created { new_id } => Some(new_id),
            _ => None,
        }
    }
}

/// Totals for one replication batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationSummary {
    pub requested: usize,
    pub created: usize,
    pub rejected: usize,
    pub failed: usize,
    /// Batch stopped before every product was attempted
    pub cancelled: bool,
    /// Input order
    pub results: Vec<ReplicationResult>,
}

impl ReplicationSummary {
    pub fn from_results(requested: usize, results: Vec<ReplicationResult>, cancelled: bool) -> Self {
        let mut summary = Self {
            requested,
            cancelled,
            ..Default::default()
        };

        for result in &results {
            match result.outcome {
                ReplicationOutcome::Created { .. } => summary.created += 1,
                ReplicationOutcome::Rejected { .. } => summary.rejected += 1,
                ReplicationOutcome::Failed { .. } => summary.failed += 1,
            }
        }

        summary.results = results;
        summary
    }
}
