//! Request and response types for search engine and change-queue operations.

use search_sync_shared::IndexerTask;
use serde_json::Value;

/// A document ready to be written to the search engine.
///
/// `id` is the final search-engine document id (already namespaced by the caller).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    pub id: String,
    pub body: Value,
}

impl IndexDocument {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

/// A document the search engine rejected inside an otherwise accepted bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemFailure {
    /// The document id.
    pub id: String,
    /// The reason reported by the search engine.
    pub reason: String,
}

/// Summary of a bulk operation.
///
/// A bulk request that the search engine accepts can still reject individual
/// items. This struct reports the aggregate counts and the rejected items so that
/// callers can log them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOperationSummary {
    /// Total number of items in the request.
    pub total: usize,
    /// Number of items applied.
    pub succeeded: usize,
    /// Number of items rejected.
    pub failed: usize,
    /// Rejected items.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkOperationSummary {
    /// Summary of a request where every item was applied.
    pub fn all_succeeded(total: usize) -> Self {
        Self {
            total,
            succeeded: total,
            failed: 0,
            failures: Vec::new(),
        }
    }
}

/// What `enqueue` did with an incoming change.
///
/// The change queue holds at most one pending row per `(data source, resource)`
/// pair. An incoming change is merged with the pending row, if any, as follows:
///
/// | pending | incoming | outcome |
/// |---|---|---|
/// | none | any | `Inserted` |
/// | CREATE | DELETE | `Cancelled` (row removed) |
/// | MODIFY | DELETE | `Overwritten` (row becomes DELETE) |
/// | anything else | | `Unchanged` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Inserted,
    Cancelled,
    Overwritten,
    Unchanged,
}

impl EnqueueOutcome {
    /// Resolve the merge rule for an incoming task against the pending one.
    pub fn resolve(pending: Option<IndexerTask>, incoming: IndexerTask) -> Self {
        match (pending, incoming) {
            (None, _) => EnqueueOutcome::Inserted,
            (Some(IndexerTask::Create), IndexerTask::Delete) => EnqueueOutcome::Cancelled,
            (Some(IndexerTask::Modify), IndexerTask::Delete) => EnqueueOutcome::Overwritten,
            (Some(_), _) => EnqueueOutcome::Unchanged,
        }
    }
}
