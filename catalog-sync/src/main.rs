//! catalog-sync - bulk catalog export and replication service
//!
//! Serves the HTTP API immediately and, unless disabled, starts a bulk
//! export of the source store in the background.

use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog_common::config::{load_config, resolve_config_path};
use catalog_sync::AppState;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for catalog-sync
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(about = "Bulk product catalog export and replication service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the configuration file)
    #[arg(short, long, env = "CATALOG_SYNC_PORT")]
    port: Option<u16>,

    /// Do not start an export run at startup
    #[arg(long)]
    no_startup_export: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref())?;
    let mut config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting catalog-sync v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Configuration: {}", config_path.display());
    info!(source = %config.source.endpoint, "Source store");
    match &config.target {
        Some(target) => info!(target = %target.endpoint, "Target store"),
        None => warn!("No target store configured, replication disabled"),
    }

    let addr = config.listen_address();
    let export_on_startup = config.export_on_startup && !args.no_startup_export;

    let state = AppState::from_config(config).context("Failed to initialize HTTP clients")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("catalog-sync listening on http://{}", addr);

    if export_on_startup {
        match state.exports.start() {
            Ok((run, _handle)) => info!(run_id = %run.run_id, "Startup export scheduled"),
            Err(e) => error!(error = %e, "Failed to start startup export"),
        }
    }

    catalog_sync::serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
