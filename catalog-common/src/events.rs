//! Event types for the catalog-sync event system
//!
//! Events are broadcast via [`EventBus`] and serialized for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Catalog sync event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// A bulk export run was started
    ExportStarted {
        run_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A new bulk operation snapshot was observed (submission or poll)
    BulkOperationProgress {
        run_id: Uuid,
        operation_id: String,
        /// Remote status string (e.g. "RUNNING")
        status: String,
        object_count: Option<u64>,
        timestamp: DateTime<Utc>,
    },

    /// Export finished and the product cache was refreshed
    ExportCompleted {
        run_id: Uuid,
        product_count: usize,
        skipped_lines: usize,
        duration_seconds: u64,
        timestamp: DateTime<Utc>,
    },

    /// Export ended with an error
    ExportFailed {
        run_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Export was cancelled by an operator
    ExportCancelled {
        run_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// One product creation call against the target store finished
    ProductReplicated {
        source_id: String,
        /// Identifier assigned by the target store (None on failure)
        new_id: Option<String>,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// A replication batch finished
    ReplicationCompleted {
        created: usize,
        rejected: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },
}

impl CatalogEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ExportStarted { .. } => "ExportStarted",
            CatalogEvent::BulkOperationProgress { .. } => "BulkOperationProgress",
            CatalogEvent::ExportCompleted { .. } => "ExportCompleted",
            CatalogEvent::ExportFailed { .. } => "ExportFailed",
            CatalogEvent::ExportCancelled { .. } => "ExportCancelled",
            CatalogEvent::ProductReplicated { .. } => "ProductReplicated",
            CatalogEvent::ReplicationCompleted { .. } => "ReplicationCompleted",
        }
    }
}

/// Broadcast channel shared by every component that reports progress
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CatalogEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers lag
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CatalogEvent,
    ) -> Result<usize, broadcast::error::SendError<CatalogEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CatalogEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
