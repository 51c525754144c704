//! Configuration loading and config file resolution
//!
//! Configuration lives in a single TOML file. The file is located using the
//! following priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CATALOG_SYNC_CONFIG` environment variable
//! 3. `./conf/config.toml` relative to the working directory
//! 4. `<config_dir>/catalog-sync/config.toml` (OS-dependent)
//!
//! Access tokens may be overridden from the environment so they never need
//! to be written to disk.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CATALOG_SYNC_CONFIG";
/// Environment override for the source store access token
pub const SOURCE_TOKEN_ENV_VAR: &str = "CATALOG_SYNC_SOURCE_TOKEN";
/// Environment override for the target store access token
pub const TARGET_TOKEN_ENV_VAR: &str = "CATALOG_SYNC_TARGET_TOKEN";

const LOCAL_CONFIG_PATH: &str = "conf/config.toml";

/// Top-level TOML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory for downloaded export files (defaults to the OS temp dir)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Start a bulk export as soon as the service is up
    #[serde(default = "default_true")]
    pub export_on_startup: bool,

    /// Store the catalog is exported from
    pub source: StoreEndpoint,

    /// Store products are replicated into (replication disabled when absent)
    #[serde(default)]
    pub target: Option<StoreEndpoint>,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub replication: ReplicationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GraphQL endpoint plus the access token used to authenticate against it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEndpoint {
    pub endpoint: String,
    pub access_token: String,
}

impl StoreEndpoint {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        }
    }

    fn validate(&self, section: &str) -> Result<()> {
        let invalid = |reason: &str| {
            Error::Config(format!(
                "[{}] endpoint must be an http(s) URL, got {:?} ({})",
                section, self.endpoint, reason
            ))
        };

        let url = Url::parse(self.endpoint.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("unsupported scheme"));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }
        if self.access_token.trim().is_empty() {
            return Err(Error::Config(format!(
                "[{}] access_token is empty",
                section
            )));
        }
        Ok(())
    }
}

// Tokens must never end up in logs
impl fmt::Debug for StoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreEndpoint")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Bulk export polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Delay between bulk operation status queries
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Give up on a bulk operation after this long
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl ExportConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

/// Replication worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Maximum concurrent product creation requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Outbound request rate against the target store
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_wait_secs() -> u64 {
    3600
}

fn default_concurrency() -> usize {
    4
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// `host:port` string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Scratch directory for export downloads
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Replace access tokens with values from the environment, when set
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = non_blank_env(SOURCE_TOKEN_ENV_VAR) {
            info!("Source access token loaded from environment variable");
            self.source.access_token = token;
        }

        if let Some(token) = non_blank_env(TARGET_TOKEN_ENV_VAR) {
            match self.target.as_mut() {
                Some(target) => {
                    info!("Target access token loaded from environment variable");
                    target.access_token = token;
                }
                None => {
                    debug!(
                        "{} is set but no [target] section is configured; ignoring",
                        TARGET_TOKEN_ENV_VAR
                    );
                }
            }
        }
    }

    /// Check endpoints, tokens and numeric settings
    pub fn validate(&self) -> Result<()> {
        self.source.validate("source")?;
        if let Some(target) = &self.target {
            target.validate("target")?;
        }

        if self.export.poll_interval_secs == 0 {
            return Err(Error::Config(
                "[export] poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.export.max_wait_secs < self.export.poll_interval_secs {
            return Err(Error::Config(
                "[export] max_wait_secs must be at least poll_interval_secs".to_string(),
            ));
        }
        if self.replication.concurrency == 0 {
            return Err(Error::Config(
                "[replication] concurrency must be greater than zero".to_string(),
            ));
        }
        if self.replication.requests_per_second == 0 {
            return Err(Error::Config(
                "[replication] requests_per_second must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Locate the configuration file
///
/// An explicit path (CLI or environment) is returned as-is even when missing,
/// so the subsequent load reports the real I/O error.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = non_blank_env(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: Working directory
    let local = PathBuf::from(LOCAL_CONFIG_PATH);
    if local.exists() {
        return Ok(local);
    }

    // Priority 4: OS config directory
    if let Some(path) = dirs::config_dir().map(|d| d.join("catalog-sync").join("config.toml")) {
        if path.exists() {
            return Ok(path);
        }
    }

    Err(Error::Config(format!(
        "No configuration file found. Provide one using one of:\n\
         1. Command line: --config /path/to/config.toml\n\
         2. Environment: {}=/path/to/config.toml\n\
         3. Working directory: ./{}\n\
         4. User config: ~/.config/catalog-sync/config.toml",
        CONFIG_ENV_VAR, LOCAL_CONFIG_PATH
    )))
}

/// Parse configuration from TOML text (no env overrides, no validation)
pub fn parse_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Read, parse, apply environment overrides and validate
pub fn load_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read config {} failed: {}", path.display(), e))
    })?;

    let mut config = parse_config(&content)?;
    config.apply_env_overrides();
    config.validate()?;

    Ok(config)
}
