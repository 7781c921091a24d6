use async_trait::async_trait;
use search_sync_shared::{IndexerAction, IndexerTask};

use crate::errors::ChangeQueueError;
use crate::types::EnqueueOutcome;

/// Trait for interacting with the change-queue store.
///
/// The queue records pending create/modify/delete changes per data source. It holds
/// at most one row per `(data_source_id, resource_id)` pair; see [`EnqueueOutcome`]
/// for the merge rule. Rows are partitioned by data source, so implementations need
/// no cross-data-source locking.
#[async_trait]
pub trait ChangeQueueRepository: Send + Sync {
    /// Record a change, merging it with the pending row for the same resource.
    async fn enqueue(
        &self,
        data_source_id: &str,
        resource_id: &str,
        task: IndexerTask,
    ) -> Result<EnqueueOutcome, ChangeQueueError>;

    /// Pending resource ids for a data source and task, in insertion order.
    ///
    /// Rows are not removed; removal is the commit step after a successful dispatch.
    async fn drain(
        &self,
        data_source_id: &str,
        task: IndexerTask,
    ) -> Result<Vec<String>, ChangeQueueError>;

    /// Delete the rows of the given resources.
    ///
    /// # Returns
    ///
    /// The number of rows removed.
    async fn remove(
        &self,
        data_source_id: &str,
        resource_ids: &[String],
    ) -> Result<u64, ChangeQueueError>;

    /// Every pending row of a data source, in insertion order.
    async fn list(&self, data_source_id: &str) -> Result<Vec<IndexerAction>, ChangeQueueError>;

    /// Number of pending rows of a data source.
    async fn count(&self, data_source_id: &str) -> Result<u64, ChangeQueueError>;
}
