//! In-memory implementation of the change queue.
//!
//! Used when no database is configured and in tests. Pending changes are lost on
//! restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use search_sync_shared::{IndexerAction, IndexerTask};
use tokio::sync::Mutex;

use crate::errors::ChangeQueueError;
use crate::interfaces::ChangeQueueRepository;
use crate::types::EnqueueOutcome;

/// Change queue held in process memory, rows keyed by data source.
#[derive(Default)]
pub struct InMemoryChangeQueue {
    rows: Mutex<HashMap<String, Vec<IndexerAction>>>,
    next_id: AtomicI64,
}

impl InMemoryChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeQueueRepository for InMemoryChangeQueue {
    async fn enqueue(
        &self,
        data_source_id: &str,
        resource_id: &str,
        task: IndexerTask,
    ) -> Result<EnqueueOutcome, ChangeQueueError> {
        let mut rows = self.rows.lock().await;
        let data_source_rows = rows.entry(data_source_id.to_string()).or_default();

        let position = data_source_rows
            .iter()
            .position(|row| row.id_resource == resource_id);
        let pending = position.map(|index| data_source_rows[index].task);

        let outcome = EnqueueOutcome::resolve(pending, task);
        match (outcome, position) {
            (EnqueueOutcome::Inserted, _) => {
                data_source_rows.push(IndexerAction {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                    id_resource: resource_id.to_string(),
                    id_data_source: data_source_id.to_string(),
                    task,
                });
            }
            (EnqueueOutcome::Cancelled, Some(index)) => {
                data_source_rows.remove(index);
            }
            (EnqueueOutcome::Overwritten, Some(index)) => {
                data_source_rows[index].task = task;
            }
            _ => {}
        }

        Ok(outcome)
    }

    async fn drain(
        &self,
        data_source_id: &str,
        task: IndexerTask,
    ) -> Result<Vec<String>, ChangeQueueError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .get(data_source_id)
            .map(|data_source_rows| {
                data_source_rows
                    .iter()
                    .filter(|row| row.task == task)
                    .map(|row| row.id_resource.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn remove(
        &self,
        data_source_id: &str,
        resource_ids: &[String],
    ) -> Result<u64, ChangeQueueError> {
        let mut rows = self.rows.lock().await;
        let Some(data_source_rows) = rows.get_mut(data_source_id) else {
            return Ok(0);
        };

        let before = data_source_rows.len();
        data_source_rows.retain(|row| !resource_ids.contains(&row.id_resource));
        Ok((before - data_source_rows.len()) as u64)
    }

    async fn list(&self, data_source_id: &str) -> Result<Vec<IndexerAction>, ChangeQueueError> {
        let rows = self.rows.lock().await;
        Ok(rows.get(data_source_id).cloned().unwrap_or_default())
    }

    async fn count(&self, data_source_id: &str) -> Result<u64, ChangeQueueError> {
        let rows = self.rows.lock().await;
        Ok(rows.get(data_source_id).map_or(0, |r| r.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARIES: &str = "libraries";

    #[tokio::test]
    async fn test_drain_returns_insertion_order_and_keeps_rows() {
        let queue = InMemoryChangeQueue::new();
        for id in ["3", "1", "2"] {
            queue.enqueue(LIBRARIES, id, IndexerTask::Create).await.unwrap();
        }
        queue.enqueue(LIBRARIES, "9", IndexerTask::Modify).await.unwrap();

        let created = queue.drain(LIBRARIES, IndexerTask::Create).await.unwrap();
        assert_eq!(created, vec!["3", "1", "2"]);
        assert_eq!(queue.count(LIBRARIES).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_create_then_delete_leaves_no_row() {
        let queue = InMemoryChangeQueue::new();
        queue.enqueue(LIBRARIES, "7", IndexerTask::Create).await.unwrap();

        let outcome = queue.enqueue(LIBRARIES, "7", IndexerTask::Delete).await.unwrap();

        assert_eq!(outcome, EnqueueOutcome::Cancelled);
        assert_eq!(queue.count(LIBRARIES).await.unwrap(), 0);
        assert!(queue
            .drain(LIBRARIES, IndexerTask::Delete)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_modify_then_delete_becomes_delete() {
        let queue = InMemoryChangeQueue::new();
        queue.enqueue(LIBRARIES, "7", IndexerTask::Modify).await.unwrap();

        let outcome = queue.enqueue(LIBRARIES, "7", IndexerTask::Delete).await.unwrap();

        assert_eq!(outcome, EnqueueOutcome::Overwritten);
        assert_eq!(
            queue.drain(LIBRARIES, IndexerTask::Delete).await.unwrap(),
            vec!["7"]
        );
        assert!(queue
            .drain(LIBRARIES, IndexerTask::Modify)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_then_modify_keeps_create() {
        let queue = InMemoryChangeQueue::new();
        queue.enqueue(LIBRARIES, "7", IndexerTask::Create).await.unwrap();
        queue.enqueue(LIBRARIES, "7", IndexerTask::Modify).await.unwrap();

        let rows = queue.list(LIBRARIES).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].task, IndexerTask::Create);
    }

    #[tokio::test]
    async fn test_remove_is_scoped_to_data_source() {
        let queue = InMemoryChangeQueue::new();
        queue.enqueue(LIBRARIES, "1", IndexerTask::Create).await.unwrap();
        queue.enqueue(LIBRARIES, "2", IndexerTask::Create).await.unwrap();
        queue.enqueue("parks", "1", IndexerTask::Create).await.unwrap();

        let removed = queue
            .remove(LIBRARIES, &["1".to_string(), "404".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(queue.count(LIBRARIES).await.unwrap(), 1);
        assert_eq!(queue.count("parks").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_data_source_is_empty() {
        let queue = InMemoryChangeQueue::new();

        assert_eq!(queue.count("unknown").await.unwrap(), 0);
        assert!(queue.list("unknown").await.unwrap().is_empty());
        assert_eq!(queue.remove("unknown", &["1".to_string()]).await.unwrap(), 0);
    }
}
