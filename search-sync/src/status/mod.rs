//! Run coordination and indexing progress.
//!
//! One [`IndexingStatus`] exists per data source. Its `running` flag is the
//! single-flight lock shared by full indexing and incremental sync.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use search_sync_shared::IndexingStatusSnapshot;

/// Per-data-source run state.
#[derive(Debug)]
pub struct IndexingStatus {
    data_source_id: String,
    running: AtomicBool,
    total_objects: AtomicU64,
    current_indexed: AtomicU64,
    log: Mutex<String>,
}

impl IndexingStatus {
    pub fn new(data_source_id: impl Into<String>) -> Self {
        Self {
            data_source_id: data_source_id.into(),
            running: AtomicBool::new(false),
            total_objects: AtomicU64::new(0),
            current_indexed: AtomicU64::new(0),
            log: Mutex::new(String::new()),
        }
    }

    pub fn data_source_id(&self) -> &str {
        &self.data_source_id
    }

    /// Take the run lock.
    ///
    /// Succeeds only on a false to true transition of `running`. The lock is
    /// released when the returned guard is dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                status: Arc::clone(self),
            })
    }

    /// Clear the run lock.
    pub fn release(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Zero the counters and clear the log at the start of a run.
    pub fn reset(&self) {
        self.total_objects.store(0, Ordering::SeqCst);
        self.current_indexed.store(0, Ordering::SeqCst);
        self.lock_log().clear();
    }

    pub fn set_total_objects(&self, total: u64) {
        self.total_objects.store(total, Ordering::SeqCst);
    }

    pub fn add_total_objects(&self, count: u64) {
        self.total_objects.fetch_add(count, Ordering::SeqCst);
    }

    /// Record processed objects.
    ///
    /// Called once per committed batch with the batch size, after its write and
    /// queue commit succeeded, so `current_indexed` moves in batch-sized steps and
    /// never counts a write that was rolled back.
    pub fn advance(&self, count: u64) {
        self.current_indexed.fetch_add(count, Ordering::SeqCst);
    }

    pub fn total_objects(&self) -> u64 {
        self.total_objects.load(Ordering::SeqCst)
    }

    pub fn current_indexed(&self) -> u64 {
        self.current_indexed.load(Ordering::SeqCst)
    }

    /// Percentage of processed objects, 0 when the total is unknown.
    pub fn progress(&self) -> f64 {
        IndexingStatusSnapshot::compute_progress(self.current_indexed(), self.total_objects())
    }

    /// Append one line to the run log.
    pub fn append_log(&self, line: &str) {
        let mut log = self.lock_log();
        log.push_str(line);
        if !line.ends_with('\n') {
            log.push('\n');
        }
    }

    pub fn log(&self) -> String {
        self.lock_log().clone()
    }

    pub fn snapshot(&self) -> IndexingStatusSnapshot {
        let total_objects = self.total_objects();
        let current_indexed = self.current_indexed();
        IndexingStatusSnapshot {
            data_source_id: self.data_source_id.clone(),
            total_objects,
            current_indexed,
            running: self.is_running(),
            progress: IndexingStatusSnapshot::compute_progress(current_indexed, total_objects),
            log: self.log(),
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, String> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Proof that the run lock of a data source is held.
///
/// Dropping the guard releases the lock on every exit path, including errors
/// and panics inside the run.
#[derive(Debug)]
pub struct RunGuard {
    status: Arc<IndexingStatus>,
}

impl RunGuard {
    pub fn status(&self) -> &IndexingStatus {
        &self.status
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.status.release();
    }
}

/// Statuses of every data source, created on first access.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    statuses: Mutex<HashMap<String, Arc<IndexingStatus>>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of a data source, created on first access.
    pub fn get(&self, data_source_id: &str) -> Arc<IndexingStatus> {
        let mut statuses = self.statuses.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            statuses
                .entry(data_source_id.to_string())
                .or_insert_with(|| Arc::new(IndexingStatus::new(data_source_id))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_exclusive_until_guard_drops() {
        let status = Arc::new(IndexingStatus::new("parks"));

        let guard = status.try_acquire().unwrap();
        assert!(status.is_running());
        assert!(status.try_acquire().is_none());

        drop(guard);
        assert!(!status.is_running());
        assert!(status.try_acquire().is_some());
    }

    #[test]
    fn test_release_then_acquire_succeeds() {
        let status = Arc::new(IndexingStatus::new("parks"));
        let guard = status.try_acquire().unwrap();
        std::mem::forget(guard);

        status.release();
        assert!(status.try_acquire().is_some());
    }

    #[test]
    fn test_concurrent_acquire_succeeds_once() {
        let status = Arc::new(IndexingStatus::new("parks"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let status = Arc::clone(&status);
                std::thread::spawn(move || status.try_acquire().map(std::mem::forget).is_some())
            })
            .collect();

        let acquired = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|acquired| *acquired)
            .count();
        assert_eq!(acquired, 1);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let status = Arc::new(IndexingStatus::new("parks"));
        let cloned = Arc::clone(&status);

        let result = std::thread::spawn(move || {
            let _guard = cloned.try_acquire().unwrap();
            panic!("run failed");
        })
        .join();

        assert!(result.is_err());
        assert!(!status.is_running());
    }

    #[test]
    fn test_progress_and_reset() {
        let status = IndexingStatus::new("parks");
        assert_eq!(status.progress(), 0.0);

        status.set_total_objects(8);
        status.advance(2);
        assert_eq!(status.progress(), 25.0);
        status.append_log("first line");

        status.reset();
        assert_eq!(status.total_objects(), 0);
        assert_eq!(status.current_indexed(), 0);
        assert!(status.log().is_empty());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let status = Arc::new(IndexingStatus::new("parks"));
        let _guard = status.try_acquire().unwrap();
        status.set_total_objects(4);
        status.advance(1);
        status.append_log("indexing");

        let snapshot = status.snapshot();

        assert_eq!(snapshot.data_source_id, "parks");
        assert!(snapshot.running);
        assert_eq!(snapshot.current_indexed, 1);
        assert_eq!(snapshot.progress, 25.0);
        assert_eq!(snapshot.log, "indexing\n");
    }

    #[test]
    fn test_registry_returns_shared_status() {
        let registry = StatusRegistry::new();
        let first = registry.get("parks");
        first.advance(3);

        assert_eq!(registry.get("parks").current_indexed(), 3);
        assert_eq!(registry.get("libraries").current_indexed(), 0);
    }
}
