//! # Catalog Sync Common Library
//!
//! Shared code for the catalog-sync service including:
//! - Configuration loading (TOML file + environment overrides)
//! - Event types (CatalogEvent enum) and the broadcast EventBus
//! - Common error types

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
