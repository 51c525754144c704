//! Bulk operation (export job) descriptor
//!
//! Every submission or poll response yields a fresh [`BulkOperation`]
//! snapshot; the poller replaces the value it holds instead of mutating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::UserError;

/// Remote bulk operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BulkOperationStatus {
    Created,
    Running,
    Completed,
    Canceling,
    Canceled,
    Expired,
    Failed,
    /// Status added remotely after this build; treated as non-terminal
    #[serde(other)]
    Unknown,
}

impl BulkOperationStatus {
    /// No further transition will happen
    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BulkOperationStatus::Completed)
    }

    /// CANCELING counts as failure: the result file will never be produced.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            BulkOperationStatus::Canceling
                | BulkOperationStatus::Canceled
                | BulkOperationStatus::Expired
                | BulkOperationStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BulkOperationStatus::Created => "CREATED",
            BulkOperationStatus::Running => "RUNNING",
            BulkOperationStatus::Completed => "COMPLETED",
            BulkOperationStatus::Canceling => "CANCELING",
            BulkOperationStatus::Canceled => "CANCELED",
            BulkOperationStatus::Expired => "EXPIRED",
            BulkOperationStatus::Failed => "FAILED",
            BulkOperationStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Snapshot of one bulk export job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    pub id: String,
    pub status: BulkOperationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_code: Option<String>,
    /// Result file size in bytes
    #[serde(default, deserialize_with = "deserialize_count")]
    pub file_size: Option<u64>,
    /// Number of records written so far
    #[serde(default, deserialize_with = "deserialize_count")]
    pub object_count: Option<u64>,
    /// Result file location (present once COMPLETED with data)
    #[serde(default)]
    pub url: Option<String>,
}

/// 64-bit counters arrive as decimal strings; accept plain numbers too.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// `data` of the `bulkOperationRunQuery` mutation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationRunQueryData {
    pub bulk_operation_run_query: Option<BulkOperationRunQueryPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationRunQueryPayload {
    #[serde(default)]
    pub bulk_operation: Option<BulkOperation>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

/// `data` of the `currentBulkOperation` query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentBulkOperationData {
    pub current_bulk_operation: Option<BulkOperation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_classification() {
        assert!(!BulkOperationStatus::Created.is_terminal());
        assert!(!BulkOperationStatus::Running.is_terminal());
        assert!(!BulkOperationStatus::Unknown.is_terminal());
        assert!(BulkOperationStatus::Completed.is_success());
        for status in [
            BulkOperationStatus::Canceling,
            BulkOperationStatus::Canceled,
            BulkOperationStatus::Expired,
            BulkOperationStatus::Failed,
        ] {
            assert!(status.is_terminal());
            assert!(status.is_failure());
            assert!(!status.is_success());
        }
    }

    #[test]
    fn test_unknown_status_does_not_fail_decode() {
        let status: BulkOperationStatus = serde_json::from_value(json!("PAUSED")).unwrap();
        assert_eq!(status, BulkOperationStatus::Unknown);
    }

    #[test]
    fn test_counts_accept_strings_and_numbers() {
        let op: BulkOperation = serde_json::from_value(json!({
            "id": "gid://shopify/BulkOperation/1",
            "status": "COMPLETED",
            "createdAt": "2024-01-15T10:00:00Z",
            "completedAt": "2024-01-15T10:02:00Z",
            "errorCode": null,
            "fileSize": "20480",
            "objectCount": 57,
            "url": "https://storage.example.com/export.jsonl"
        }))
        .unwrap();

        assert_eq!(op.status, BulkOperationStatus::Completed);
        assert_eq!(op.file_size, Some(20480));
        assert_eq!(op.object_count, Some(57));
        assert!(op.completed_at.is_some());
        assert_eq!(op.error_code, None);
    }

    #[test]
    fn test_minimal_snapshot() {
        let op: BulkOperation = serde_json::from_value(json!({
            "id": "gid://shopify/BulkOperation/2",
            "status": "CREATED",
            "createdAt": "2024-01-15T10:00:00Z",
            "fileSize": null
        }))
        .unwrap();

        assert_eq!(op.file_size, None);
        assert_eq!(op.url, None);
        assert_eq!(op.completed_at, None);
    }
}
