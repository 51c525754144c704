//! Store integration and export pipeline services

pub mod bulk_poller;
pub mod bulk_submitter;
pub mod export_pipeline;
pub mod export_supervisor;
pub mod product_query;
pub mod record_reconciler;
pub mod replicator;
pub mod result_fetcher;
pub mod transport;

pub use bulk_poller::{BulkPoller, PollSettings};
pub use bulk_submitter::submit_bulk_export;
pub use export_pipeline::{ExportOutcome, ExportPipeline};
pub use export_supervisor::{ExportStatus, ExportSupervisor};
pub use product_query::{fetch_recent_products, ProductEdge, ProductNode};
pub use record_reconciler::{reconcile, ReconciledCatalog};
pub use replicator::{build_product_create_request, Replicator, METAFIELD_TYPE};
pub use result_fetcher::{HttpDownloader, ResultDownloader, ScratchFile};
pub use transport::{execute, GraphqlTransport, HttpTransport};
