//! Error types for the sync engine.

use search_sync_repository::{ChangeQueueError, SearchEngineError};
use thiserror::Error;

/// Errors raised by data sources and attribute providers.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The upstream system could not be reached.
    #[error("Data source unreachable: {0}")]
    Unreachable(String),

    /// The upstream system answered with data that cannot be used.
    #[error("Inconsistent data source response: {0}")]
    Inconsistent(String),
}

impl FetchError {
    /// Create an unreachable error.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// Create an inconsistency error.
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }
}

/// Errors that can occur during a sync or full-index run.
///
/// Orchestrators propagate these to the engine, which contains them per data
/// source inside a sweep.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Error from a data source.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from the search engine.
    #[error("Search engine error: {0}")]
    SearchEngine(#[from] SearchEngineError),

    /// Error from the change-queue store.
    #[error("Change queue error: {0}")]
    ChangeQueue(#[from] ChangeQueueError),

    /// Invalid data source or engine configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No data source is registered under the id.
    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),
}

impl SyncError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an unknown data source error.
    pub fn unknown_data_source(id: impl Into<String>) -> Self {
        Self::UnknownDataSource(id.into())
    }
}
