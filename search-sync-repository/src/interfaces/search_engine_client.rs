//! Search engine client trait definition.
//!
//! This module defines the abstract interface for the search engine operations the
//! sync engine invokes, allowing different backend implementations (OpenSearch,
//! Elasticsearch, in-memory mocks).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchEngineError;
use crate::types::{BulkOperationSummary, IndexDocument};

/// Abstracts the underlying search engine implementation.
///
/// All methods return `Result<T, SearchEngineError>`. The sync engine treats every
/// error as a failure of the current batch and never interprets response bodies
/// beyond logging them.
///
/// Document writes are keyed by document id, so resubmitting a batch converges to
/// the same index state.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Check whether an index exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The index exists
    /// * `Ok(false)` - The index does not exist
    /// * `Err(SearchEngineError)` - If the lookup fails
    async fn index_exists(&self, index: &str) -> Result<bool, SearchEngineError>;

    /// Create an index with the given settings/mappings body.
    ///
    /// # Arguments
    ///
    /// * `index` - The index name
    /// * `mappings` - The full create-index body (e.g. `{"mappings": {...}}`)
    async fn create_index(&self, index: &str, mappings: &Value) -> Result<(), SearchEngineError>;

    /// Delete an index.
    async fn delete_index(&self, index: &str) -> Result<(), SearchEngineError>;

    /// Index (create or replace) multiple documents in a single bulk request.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkOperationSummary)` - The request was accepted; individual items may still
    ///   have been rejected
    /// * `Err(SearchEngineError)` - If the bulk request fails entirely
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkOperationSummary, SearchEngineError>;

    /// Partially update a document, creating it if it doesn't exist.
    ///
    /// Only the fields present in `doc` are written.
    async fn partial_update(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<(), SearchEngineError>;

    /// Partially update multiple documents.
    ///
    /// The default implementation issues one `partial_update` per document and stops at
    /// the first failed call, so the batch fails as a whole; backends with a bulk API
    /// override it with a single request.
    async fn bulk_update(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkOperationSummary, SearchEngineError> {
        for document in documents {
            self.partial_update(index, &document.id, &document.body)
                .await?;
        }

        Ok(BulkOperationSummary::all_succeeded(documents.len()))
    }

    /// Delete every document of an index matching a query.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - The number of deleted documents
    /// * `Err(SearchEngineError)` - If the deletion fails
    async fn delete_by_query(&self, index: &str, query: &Value) -> Result<u64, SearchEngineError>;
}
