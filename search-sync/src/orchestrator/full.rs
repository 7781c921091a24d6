//! Full indexing: rebuilds a target index from every record of a data source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use search_sync_repository::default_mappings;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument};
use uuid::Uuid;

use super::SyncReport;
use crate::batch::BatchIterator;
use crate::dispatcher::{BulkAction, BulkDispatcher};
use crate::errors::SyncError;
use crate::source::DataSource;
use crate::status::RunGuard;

/// Indexes the complete enumeration of a data source.
///
/// Does not read or modify the change queue. Index deletion or creation done
/// before a failure is not rolled back; a later reset run recovers.
///
/// Index preparation is serialized per index name, so data sources sharing a
/// target index never race on its creation.
pub struct FullIndexOrchestrator {
    dispatcher: Arc<BulkDispatcher>,
    index_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl FullIndexOrchestrator {
    pub fn new(dispatcher: Arc<BulkDispatcher>) -> Self {
        Self {
            dispatcher,
            index_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Index every record of a data source.
    ///
    /// With `reset`, the target index is deleted if it exists and recreated.
    /// Without it, a missing index is created and an existing one is kept.
    #[instrument(
        skip_all,
        fields(data_source_id = %source.id(), reset = reset, run_id = %Uuid::new_v4())
    )]
    pub async fn full_index(
        &self,
        source: Arc<dyn DataSource>,
        batch_size: usize,
        reset: bool,
        guard: &RunGuard,
    ) -> Result<SyncReport, SyncError> {
        let status = guard.status();
        status.reset();

        let started = Instant::now();
        let ids = source.list_resource_ids().await?;
        status.set_total_objects(ids.len() as u64);
        info!(total = ids.len(), "Starting full indexing");

        self.prepare_index(source.as_ref(), reset).await?;

        let mut iterator = BatchIterator::new(Arc::clone(&source), ids, batch_size);
        let mut processed = 0;
        while let Some(page) = iterator.next_page().await? {
            processed += self
                .dispatcher
                .dispatch_objects(source.as_ref(), BulkAction::Index, page.objects, None, status)
                .await?;
        }

        let duration = started.elapsed();
        status.append_log(&format!(
            "Number of objects indexed for the Data Source '{}' : {} (duration : {}ms)",
            source.name(),
            processed,
            duration.as_millis()
        ));
        info!(
            count = processed,
            duration_ms = duration.as_millis() as u64,
            "Full indexing completed"
        );

        Ok(SyncReport {
            data_source_id: source.id().to_string(),
            processed,
            duration,
        })
    }

    async fn prepare_index(&self, source: &dyn DataSource, reset: bool) -> Result<(), SyncError> {
        let search = self.dispatcher.search();
        let index = source.target_index_name();

        let lock = self.index_lock(index);
        let _preparing = lock.lock().await;

        let exists = search.index_exists(index).await?;

        if reset && exists {
            search.delete_index(index).await?;
        }
        if reset || !exists {
            let mappings = source
                .mappings()
                .unwrap_or_else(|| default_mappings(source.localizable()));
            search.create_index(index, &mappings).await?;
        }

        Ok(())
    }

    fn index_lock(&self, index: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.index_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(index.to_string()).or_default())
    }
}
