//! Indexing status snapshot types.

use serde::{Deserialize, Serialize};

/// Point-in-time copy of a data source's indexing status.
///
/// Snapshots are what progress observers poll; the live status itself is owned by
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingStatusSnapshot {
    pub data_source_id: String,
    pub total_objects: u64,
    pub current_indexed: u64,
    pub running: bool,
    /// Percentage in `[0, 100]`, `0` when `total_objects` is zero.
    pub progress: f64,
    pub log: String,
}

impl IndexingStatusSnapshot {
    /// Compute the progress percentage for the given counters.
    pub fn compute_progress(current_indexed: u64, total_objects: u64) -> f64 {
        if total_objects == 0 {
            return 0.0;
        }
        current_indexed as f64 / total_objects as f64 * 100.0
    }
}
