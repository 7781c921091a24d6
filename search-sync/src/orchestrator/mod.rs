//! Orchestrators for the sync engine.
//!
//! [`IncrementalSyncOrchestrator`] applies the pending change queue of a data
//! source; [`FullIndexOrchestrator`] rebuilds a target index from a complete
//! enumeration. Both run under the data source's run lock, which callers prove
//! by passing a [`RunGuard`](crate::status::RunGuard).

mod full;
mod incremental;

use std::time::Duration;

pub use full::FullIndexOrchestrator;
pub use incremental::IncrementalSyncOrchestrator;

/// Outcome of one orchestrator run for one data source.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub data_source_id: String,
    /// Objects written or deleted.
    pub processed: usize,
    pub duration: Duration,
}
