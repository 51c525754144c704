//! Common error types for catalog-sync

use thiserror::Error;

/// Common result type for catalog-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the catalog-sync crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
