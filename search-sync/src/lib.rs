//! # Search Sync
//!
//! Keeps search-engine indices synchronized with pluggable data sources, either
//! by a full bulk load of a data source or by applying the create/modify/delete
//! changes recorded in a change queue since the last sync.
//!
//! ## Architecture
//!
//! 1. **Source**: the data source contract and registry
//! 2. **Batch**: bounded-memory iteration over the objects of a data source
//! 3. **Dispatcher**: bulk writes to the search engine and change-queue commits
//! 4. **Orchestrator**: incremental sync and full indexing of one data source
//! 5. **Status**: single-flight run lock and progress per data source
//! 6. **Engine**: the entry points called by schedulers and operators
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`source`]: Data source contract, registry and static data source
//! - [`batch`]: Batch iterator
//! - [`dispatcher`]: Bulk dispatcher
//! - [`orchestrator`]: Incremental and full orchestrators
//! - [`status`]: Indexing status and run lock
//! - [`engine`]: Sync engine entry points
//! - [`errors`]: Error types for the engine

pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod orchestrator;
pub mod source;
pub mod status;

pub use config::{Dependencies, SyncConfig, SyncMode};
pub use engine::SyncEngine;
pub use errors::{FetchError, SyncError};
pub use orchestrator::SyncReport;
pub use source::{DataSource, DataSourceRegistry, ExternalAttributeProvider, StaticDataSource};

use thiserror::Error;

/// Errors that can occur during engine initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync error.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
