//! Environment configuration of the sync engine.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default prefix of document ids.
const DEFAULT_INSTANCE_NAME: &str = "search-sync";

/// Default batch size of data sources declaring none.
const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection at a fixed interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Sweep run by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Apply the pending change queue of every data source.
    Incremental,
    /// Full-index into the existing indices.
    Full,
    /// Recreate the indices, then full-index.
    FullReset,
}

impl SyncMode {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "incremental".to_string())
            .to_lowercase()
            .as_str()
        {
            "incremental" => Self::Incremental,
            "full" => Self::Full,
            "full-reset" | "full_reset" => Self::FullReset,
            _ => {
                warn!("Invalid SYNC_MODE, defaulting to 'incremental'");
                Self::Incremental
            }
        }
    }
}

/// Settings read from the environment.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub opensearch_url: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    /// PostgreSQL change-queue store. `None` selects the in-memory queue.
    pub database_url: Option<String>,
    pub instance_name: String,
    pub default_batch_size: usize,
    /// Directory of JSON data-source manifests.
    pub data_sources_dir: Option<PathBuf>,
    pub mode: SyncMode,
    /// Full sweeps only cover data sources opted in to scheduled indexing.
    pub daemon_only: bool,
}

impl SyncConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `DATABASE_URL`: PostgreSQL change-queue store (default: in-memory queue)
    /// - `SYNC_INSTANCE_NAME`: Prefix of document ids (default: search-sync)
    /// - `SYNC_DEFAULT_BATCH_SIZE`: Batch size of data sources declaring none (default: 10000)
    /// - `SYNC_DATA_SOURCES_DIR`: Directory of data-source manifests (default: none)
    /// - `SYNC_MODE`: "incremental", "full" or "full-reset" (default: incremental)
    /// - `SYNC_DAEMON_ONLY`: Restrict full sweeps to daemon-eligible data sources (default: true)
    ///
    /// # Errors
    ///
    /// Returns `IndexingError::ConfigError` if the default batch size is 0.
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_batch_size =
            parse_or_default(&lookup, "SYNC_DEFAULT_BATCH_SIZE", DEFAULT_BATCH_SIZE);
        if default_batch_size == 0 {
            return Err(IndexingError::config(
                "SYNC_DEFAULT_BATCH_SIZE must be at least 1",
            ));
        }

        Ok(Self {
            opensearch_url: lookup("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            connection_mode: ConnectionMode::parse(lookup("OPENSEARCH_CONNECTION_MODE")),
            retry_interval: Duration::from_secs(parse_or_default(
                &lookup,
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            instance_name: lookup("SYNC_INSTANCE_NAME")
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_INSTANCE_NAME.to_string()),
            default_batch_size,
            data_sources_dir: lookup("SYNC_DATA_SOURCES_DIR").map(PathBuf::from),
            mode: SyncMode::parse(lookup("SYNC_MODE")),
            daemon_only: parse_or_default(&lookup, "SYNC_DAEMON_ONLY", true),
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(variable = key, value = %value, "Invalid value, using default");
            default
        }),
    }
}
