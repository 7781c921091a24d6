//! Entry points of the sync engine.
//!
//! [`SyncEngine`] is what schedulers and operator actions call. It owns the data
//! source registry, the per-data-source statuses and the orchestrators, and it
//! takes the single-flight lock before any run.

use std::sync::Arc;

use futures::future::join_all;
use search_sync_repository::{ChangeQueueRepository, EnqueueOutcome, SearchEngineClient};
use search_sync_shared::{IndexerAction, IndexerTask, IndexingStatusSnapshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::dispatcher::BulkDispatcher;
use crate::errors::SyncError;
use crate::orchestrator::{FullIndexOrchestrator, IncrementalSyncOrchestrator, SyncReport};
use crate::source::{DataSource, DataSourceRegistry};
use crate::status::{IndexingStatus, RunGuard, StatusRegistry};

#[derive(Debug, Clone, Copy)]
enum RunKind {
    Incremental,
    Full { reset: bool },
}

/// The sync engine.
///
/// Cheap to clone; clones share the registry, statuses and store handles.
///
/// Synchronous entry points (`*_all`, [`SyncEngine::incremental_sync`],
/// [`SyncEngine::full_index`]) return once the run is over. Asynchronous entry
/// points (`*_one`) take the run lock, spawn the run on the tokio runtime and
/// return immediately; observers poll [`SyncEngine::status`].
#[derive(Clone)]
pub struct SyncEngine {
    registry: Arc<DataSourceRegistry>,
    statuses: Arc<StatusRegistry>,
    queue: Arc<dyn ChangeQueueRepository>,
    incremental: Arc<IncrementalSyncOrchestrator>,
    full: Arc<FullIndexOrchestrator>,
}

impl SyncEngine {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `registry` - Data sources to serve
    /// * `search` - Search engine client
    /// * `queue` - Change-queue store
    /// * `instance_name` - Prefix of every document id
    pub fn new(
        registry: DataSourceRegistry,
        search: Arc<dyn SearchEngineClient>,
        queue: Arc<dyn ChangeQueueRepository>,
        instance_name: impl Into<String>,
    ) -> Self {
        let dispatcher = Arc::new(BulkDispatcher::new(
            search,
            Arc::clone(&queue),
            instance_name,
        ));

        Self {
            registry: Arc::new(registry),
            statuses: Arc::new(StatusRegistry::new()),
            incremental: Arc::new(IncrementalSyncOrchestrator::new(
                Arc::clone(&dispatcher),
                Arc::clone(&queue),
            )),
            full: Arc::new(FullIndexOrchestrator::new(dispatcher)),
            queue,
        }
    }

    pub fn registry(&self) -> &DataSourceRegistry {
        &self.registry
    }

    /// Full-index every data source concurrently.
    ///
    /// A failing data source does not stop the others; its error is logged and
    /// appended to its status log.
    ///
    /// # Arguments
    ///
    /// * `reset` - Recreate each target index first
    /// * `only_daemon_eligible` - Skip data sources not opted in to scheduled full
    ///   indexing
    ///
    /// # Returns
    ///
    /// The status logs of the data sources, in registration order.
    pub async fn full_index_all(&self, reset: bool, only_daemon_eligible: bool) -> String {
        let sources: Vec<Arc<dyn DataSource>> = self
            .registry
            .all()
            .iter()
            .filter(|source| !only_daemon_eligible || source.uses_full_indexing_daemon())
            .cloned()
            .collect();

        self.sweep(sources, RunKind::Full { reset }).await
    }

    /// Start a full index of one data source in the background.
    ///
    /// Returns `Ok(None)` without doing anything when the data source is already
    /// running.
    pub fn full_index_one(
        &self,
        data_source_id: &str,
        reset: bool,
    ) -> Result<Option<JoinHandle<()>>, SyncError> {
        self.spawn_run(data_source_id, RunKind::Full { reset })
    }

    /// Full-index one data source and wait for the run.
    ///
    /// Returns `Ok(None)` when the data source is already running.
    pub async fn full_index(
        &self,
        data_source_id: &str,
        reset: bool,
    ) -> Result<Option<SyncReport>, SyncError> {
        let source = self.registry.require(data_source_id)?;
        self.run_locked(source, RunKind::Full { reset }).await
    }

    /// Incrementally sync every data source concurrently.
    ///
    /// Failure isolation and the returned summary are as for
    /// [`SyncEngine::full_index_all`].
    pub async fn incremental_sync_all(&self) -> String {
        let sources = self.registry.all().to_vec();
        self.sweep(sources, RunKind::Incremental).await
    }

    /// Start an incremental sync of one data source in the background.
    ///
    /// Returns `Ok(None)` without doing anything when the data source is already
    /// running.
    pub fn incremental_sync_one(
        &self,
        data_source_id: &str,
    ) -> Result<Option<JoinHandle<()>>, SyncError> {
        self.spawn_run(data_source_id, RunKind::Incremental)
    }

    /// Incrementally sync one data source and wait for the run.
    ///
    /// Returns `Ok(None)` when the data source is already running.
    pub async fn incremental_sync(
        &self,
        data_source_id: &str,
    ) -> Result<Option<SyncReport>, SyncError> {
        let source = self.registry.require(data_source_id)?;
        self.run_locked(source, RunKind::Incremental).await
    }

    /// Record a change of a resource in the change queue.
    pub async fn enqueue_change(
        &self,
        data_source_id: &str,
        resource_id: &str,
        task: IndexerTask,
    ) -> Result<EnqueueOutcome, SyncError> {
        self.registry.require(data_source_id)?;
        Ok(self.queue.enqueue(data_source_id, resource_id, task).await?)
    }

    /// Pending change-queue rows of a data source, in insertion order.
    pub async fn pending_changes(
        &self,
        data_source_id: &str,
    ) -> Result<Vec<IndexerAction>, SyncError> {
        self.registry.require(data_source_id)?;
        Ok(self.queue.list(data_source_id).await?)
    }

    /// Snapshot of the indexing status of a data source.
    pub fn status(&self, data_source_id: &str) -> Result<IndexingStatusSnapshot, SyncError> {
        self.registry.require(data_source_id)?;
        Ok(self.statuses.get(data_source_id).snapshot())
    }

    async fn sweep(&self, sources: Vec<Arc<dyn DataSource>>, kind: RunKind) -> String {
        let runs = sources.into_iter().map(|source| async move {
            let status = self.statuses.get(source.id());
            // Errors are already in the status log.
            match self.run_locked(Arc::clone(&source), kind).await {
                Ok(Some(_)) | Err(_) => status.log(),
                Ok(None) => Self::skipped_line(source.as_ref()),
            }
        });

        join_all(runs).await.concat()
    }

    async fn run_locked(
        &self,
        source: Arc<dyn DataSource>,
        kind: RunKind,
    ) -> Result<Option<SyncReport>, SyncError> {
        let status = self.statuses.get(source.id());
        let Some(guard) = status.try_acquire() else {
            info!(data_source_id = %source.id(), "Data source already running, skipped");
            return Ok(None);
        };

        self.execute(source, kind, &guard).await.map(Some)
    }

    fn spawn_run(
        &self,
        data_source_id: &str,
        kind: RunKind,
    ) -> Result<Option<JoinHandle<()>>, SyncError> {
        let source = self.registry.require(data_source_id)?;
        let status = self.statuses.get(data_source_id);

        // The lock is taken before spawning so that two close triggers cannot
        // both start a run.
        let Some(guard) = status.try_acquire() else {
            info!(data_source_id = %data_source_id, "Data source already running, skipped");
            return Ok(None);
        };

        let engine = self.clone();
        Ok(Some(tokio::spawn(async move {
            // Failures are recorded in the status log by `execute`.
            let _ = engine.execute(source, kind, &guard).await;
        })))
    }

    async fn execute(
        &self,
        source: Arc<dyn DataSource>,
        kind: RunKind,
        guard: &RunGuard,
    ) -> Result<SyncReport, SyncError> {
        let batch_size = self.registry.batch_size_for(source.as_ref());
        let result = match kind {
            RunKind::Incremental => {
                self.incremental
                    .sync_one(Arc::clone(&source), batch_size, guard)
                    .await
            }
            RunKind::Full { reset } => {
                self.full
                    .full_index(Arc::clone(&source), batch_size, reset, guard)
                    .await
            }
        };

        if let Err(e) = &result {
            Self::record_failure(source.as_ref(), guard.status(), e);
        }
        result
    }

    fn record_failure(source: &dyn DataSource, status: &IndexingStatus, error: &SyncError) {
        error!(
            data_source_id = %source.id(),
            error = %error,
            "Indexing run failed"
        );
        status.append_log(&format!(
            "Indexing of the Data Source '{}' failed: {}",
            source.name(),
            error
        ));
    }

    fn skipped_line(source: &dyn DataSource) -> String {
        format!(
            "Data Source '{}' is already being indexed, skipped\n",
            source.name()
        )
    }
}
