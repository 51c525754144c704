//! Data models for catalog-sync

pub mod bulk_operation;
pub mod export_run;
pub mod graphql;
pub mod product;
pub mod replication;

pub use bulk_operation::{
    BulkOperation, BulkOperationRunQueryData, BulkOperationRunQueryPayload, BulkOperationStatus,
    CurrentBulkOperationData,
};
pub use export_run::{ExportRun, ExportState};
pub use graphql::{GraphqlError, GraphqlRequest, GraphqlResponse, UserError};
pub use product::{ExportRecord, Metafield, Product, RecordKind};
pub use replication::{ReplicationOutcome, ReplicationResult, ReplicationSummary};
