//! Incremental sync: drains the change queue of one data source.

use std::sync::Arc;
use std::time::Instant;

use search_sync_repository::ChangeQueueRepository;
use search_sync_shared::IndexerTask;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::SyncReport;
use crate::batch::BatchIterator;
use crate::dispatcher::{BulkAction, BulkDispatcher};
use crate::errors::SyncError;
use crate::source::DataSource;
use crate::status::{IndexingStatus, RunGuard};

/// Applies pending changes to the target index of a data source.
///
/// Task kinds are processed strictly in the order CREATE, MODIFY, DELETE and
/// batches strictly one after another. A failed batch aborts the run; batches
/// committed before it stay committed and the rest stays pending.
pub struct IncrementalSyncOrchestrator {
    dispatcher: Arc<BulkDispatcher>,
    queue: Arc<dyn ChangeQueueRepository>,
}

impl IncrementalSyncOrchestrator {
    pub fn new(dispatcher: Arc<BulkDispatcher>, queue: Arc<dyn ChangeQueueRepository>) -> Self {
        Self { dispatcher, queue }
    }

    /// Sync one data source.
    ///
    /// Resets the status, drains each task kind and appends a summary line with
    /// the processed count and the duration to the status log.
    #[instrument(
        skip_all,
        fields(data_source_id = %source.id(), run_id = %Uuid::new_v4())
    )]
    pub async fn sync_one(
        &self,
        source: Arc<dyn DataSource>,
        batch_size: usize,
        guard: &RunGuard,
    ) -> Result<SyncReport, SyncError> {
        let status = guard.status();
        status.reset();

        let started = Instant::now();
        let mut processed = 0;

        for task in IndexerTask::ALL {
            let ids = self.queue.drain(source.id(), task).await?;
            if ids.is_empty() {
                debug!(task = %task, "No pending changes");
                continue;
            }

            info!(task = %task, count = ids.len(), "Applying pending changes");
            status.add_total_objects(ids.len() as u64);

            processed += match task {
                IndexerTask::Create => {
                    self.sync_objects(&source, BulkAction::Index, ids, batch_size, status)
                        .await?
                }
                IndexerTask::Modify => {
                    self.sync_objects(&source, BulkAction::Update, ids, batch_size, status)
                        .await?
                }
                IndexerTask::Delete => {
                    self.sync_deletes(source.as_ref(), &ids, batch_size, status)
                        .await?
                }
            };
        }

        let duration = started.elapsed();
        status.append_log(&format!(
            "Number of documents processed by the incremental service from the Data Source '{}' : {} (duration : {}ms)",
            source.name(),
            processed,
            duration.as_millis()
        ));
        info!(
            count = processed,
            duration_ms = duration.as_millis() as u64,
            "Incremental sync completed"
        );

        Ok(SyncReport {
            data_source_id: source.id().to_string(),
            processed,
            duration,
        })
    }

    async fn sync_objects(
        &self,
        source: &Arc<dyn DataSource>,
        action: BulkAction,
        ids: Vec<String>,
        batch_size: usize,
        status: &IndexingStatus,
    ) -> Result<usize, SyncError> {
        let mut iterator = BatchIterator::new(Arc::clone(source), ids, batch_size);
        let mut processed = 0;

        while let Some(page) = iterator.next_page().await? {
            processed += self
                .dispatcher
                .dispatch_objects(
                    source.as_ref(),
                    action,
                    page.objects,
                    Some(&page.ids),
                    status,
                )
                .await?;
        }

        Ok(processed)
    }

    async fn sync_deletes(
        &self,
        source: &dyn DataSource,
        ids: &[String],
        batch_size: usize,
        status: &IndexingStatus,
    ) -> Result<usize, SyncError> {
        let mut processed = 0;
        for chunk in ids.chunks(batch_size.max(1)) {
            processed += self
                .dispatcher
                .dispatch_deletes(source, chunk, status)
                .await?;
        }
        Ok(processed)
    }
}
