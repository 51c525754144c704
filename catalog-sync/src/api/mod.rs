//! HTTP API handlers for catalog-sync

pub mod export;
pub mod products;
pub mod replicate;
pub mod sse;
pub mod status;

pub use export::export_routes;
pub use products::product_routes;
pub use replicate::replicate_routes;
pub use sse::event_routes;
pub use status::status_routes;
