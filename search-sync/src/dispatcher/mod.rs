//! Bulk dispatcher for the sync engine.
//!
//! Turns a batch of data objects into one bulk request against the search engine
//! and commits the matching change-queue rows once the request succeeded.

use std::sync::Arc;

use search_sync_repository::{
    ids_query, BulkOperationSummary, ChangeQueueRepository, IndexDocument, SearchEngineClient,
    SearchEngineError,
};
use search_sync_shared::DataObject;
use tracing::{debug, error, instrument, warn};

use crate::errors::{FetchError, SyncError};
use crate::source::DataSource;
use crate::status::IndexingStatus;

/// Maximum number of rejected items logged per bulk request.
const MAX_LOGGED_FAILURES: usize = 5;

/// Write semantics of a bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Whole-document index, used for creations and full indexing.
    Index,
    /// Partial update with upsert, used for modifications.
    Update,
}

/// Dispatches batches to the search engine and commits the change queue.
///
/// Each dispatch is one transaction boundary: the search engine write comes
/// first, and the queue rows are removed only after it succeeded. A failed write
/// leaves the rows pending so that the next run retries them.
pub struct BulkDispatcher {
    search: Arc<dyn SearchEngineClient>,
    queue: Arc<dyn ChangeQueueRepository>,
    instance_name: String,
}

impl BulkDispatcher {
    /// Create a dispatcher.
    ///
    /// # Arguments
    ///
    /// * `search` - Search engine client
    /// * `queue` - Change queue committed after each successful write
    /// * `instance_name` - Prefix of every document id
    pub fn new(
        search: Arc<dyn SearchEngineClient>,
        queue: Arc<dyn ChangeQueueRepository>,
        instance_name: impl Into<String>,
    ) -> Self {
        Self {
            search,
            queue,
            instance_name: instance_name.into(),
        }
    }

    pub fn search(&self) -> &Arc<dyn SearchEngineClient> {
        &self.search
    }

    /// Search-engine id of a resource: `<instance>_<data source>_<resource>`.
    ///
    /// Keeps ids unique across data sources sharing one index.
    pub fn document_id(&self, data_source_id: &str, resource_id: &str) -> String {
        format!("{}_{}_{}", self.instance_name, data_source_id, resource_id)
    }

    /// Run the attribute providers of a data source over a batch.
    ///
    /// Providers must not change ids; a changed id is restored.
    pub async fn enrich(
        &self,
        source: &dyn DataSource,
        objects: &mut [DataObject],
    ) -> Result<(), FetchError> {
        let providers = source.external_attribute_providers();
        if providers.is_empty() || objects.is_empty() {
            return Ok(());
        }

        let original_ids: Vec<String> = objects.iter().map(|object| object.id.clone()).collect();

        for provider in &providers {
            provider.provide_batch_attributes(objects).await?;
        }

        for (object, original_id) in objects.iter_mut().zip(original_ids) {
            if object.id != original_id {
                warn!(
                    data_source_id = %source.id(),
                    original_id = %original_id,
                    changed_id = %object.id,
                    "Attribute provider changed an object id, restoring it"
                );
                object.id = original_id;
            }
        }

        Ok(())
    }

    /// Index or update a batch of objects.
    ///
    /// When `commit_ids` is given, those queue rows are removed after the write
    /// succeeded. They are the ids of the fetched slice, including ids the data
    /// source no longer returns. A batch without objects issues no search
    /// request.
    ///
    /// # Returns
    ///
    /// The number of objects written.
    #[instrument(
        skip_all,
        fields(data_source_id = %source.id(), action = ?action, count = objects.len())
    )]
    pub async fn dispatch_objects(
        &self,
        source: &dyn DataSource,
        action: BulkAction,
        mut objects: Vec<DataObject>,
        commit_ids: Option<&[String]>,
        status: &IndexingStatus,
    ) -> Result<usize, SyncError> {
        let index = source.target_index_name();

        if !objects.is_empty() {
            self.enrich(source, &mut objects).await?;

            let documents = self.to_documents(source.id(), &objects)?;
            let summary = match action {
                BulkAction::Index => self.search.bulk_index(index, &documents).await,
                BulkAction::Update => self.search.bulk_update(index, &documents).await,
            }
            .inspect_err(|e| {
                error!(
                    index = %index,
                    error = %e,
                    count = documents.len(),
                    "Bulk write failed, queue rows stay pending"
                );
            })?;

            Self::log_summary(index, &summary);
        }

        if let Some(ids) = commit_ids {
            let removed = self.queue.remove(source.id(), ids).await?;
            debug!(removed = removed, "Committed change-queue rows");
        }

        let count = objects.len();
        status.advance(count as u64);
        Ok(count)
    }

    /// Delete the documents of the given resources with one delete-by-query
    /// call, then remove their queue rows.
    ///
    /// # Returns
    ///
    /// The number of resources processed.
    #[instrument(skip_all, fields(data_source_id = %source.id(), count = resource_ids.len()))]
    pub async fn dispatch_deletes(
        &self,
        source: &dyn DataSource,
        resource_ids: &[String],
        status: &IndexingStatus,
    ) -> Result<usize, SyncError> {
        if resource_ids.is_empty() {
            return Ok(0);
        }

        let index = source.target_index_name();
        let document_ids: Vec<String> = resource_ids
            .iter()
            .map(|id| self.document_id(source.id(), id))
            .collect();

        let deleted = self
            .search
            .delete_by_query(index, &ids_query(&document_ids))
            .await
            .inspect_err(|e| {
                error!(
                    index = %index,
                    error = %e,
                    count = document_ids.len(),
                    "Delete by query failed, queue rows stay pending"
                );
            })?;
        debug!(index = %index, deleted = deleted, "Deleted documents");

        let removed = self.queue.remove(source.id(), resource_ids).await?;
        debug!(removed = removed, "Committed change-queue rows");

        status.advance(resource_ids.len() as u64);
        Ok(resource_ids.len())
    }

    fn to_documents(
        &self,
        data_source_id: &str,
        objects: &[DataObject],
    ) -> Result<Vec<IndexDocument>, SearchEngineError> {
        objects
            .iter()
            .map(|object| {
                let body = object
                    .to_document()
                    .map_err(|e| SearchEngineError::serialization(e.to_string()))?;
                Ok(IndexDocument::new(
                    self.document_id(data_source_id, &object.id),
                    body,
                ))
            })
            .collect()
    }

    fn log_summary(index: &str, summary: &BulkOperationSummary) {
        if summary.failed == 0 {
            debug!(index = %index, count = summary.succeeded, "Bulk write completed");
            return;
        }

        warn!(
            index = %index,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk write completed with some failures"
        );
        for failure in summary.failures.iter().take(MAX_LOGGED_FAILURES) {
            error!(
                index = %index,
                document_id = %failure.id,
                reason = %failure.reason,
                "Document rejected"
            );
        }
    }
}
