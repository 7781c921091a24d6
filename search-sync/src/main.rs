//! Search Sync Main Entry Point
//!
//! Runs one sweep over the registered data sources, as selected by `SYNC_MODE`,
//! then exits. Meant to be triggered by an external scheduler.

use dotenv::dotenv;
use search_sync::{Dependencies, IndexingError, SyncMode};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_sync=info,search_sync_repository=info"));

    let json_output = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(e.to_string()))?;

        info!(
            service_name = "search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(e.to_string()))?;

        info!(
            service_name = "search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting Search Sync");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let engine = deps.engine;
    let mode = deps.config.mode;
    let daemon_only = deps.config.daemon_only;

    let sweep = async move {
        match mode {
            SyncMode::Incremental => engine.incremental_sync_all().await,
            SyncMode::Full => engine.full_index_all(false, daemon_only).await,
            SyncMode::FullReset => engine.full_index_all(true, daemon_only).await,
        }
    };

    tokio::select! {
        summary = sweep => {
            info!(mode = ?mode, summary = %summary.trim_end(), "Sweep completed");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Received shutdown signal, interrupting the sweep");
        }
    }

    Ok(())
}
