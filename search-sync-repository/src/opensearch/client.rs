//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts},
    BulkParts, DeleteByQueryParts, OpenSearch, UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchEngineError;
use crate::interfaces::SearchEngineClient;
use crate::types::{BulkItemFailure, BulkOperationSummary, IndexDocument};

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// use search_sync_repository::{IndexDocument, OpenSearchClient, SearchEngineClient};
///
/// let client = OpenSearchClient::new("http://localhost:9200").await?;
/// let documents = vec![IndexDocument::new("site_libraries_42", json!({"title": "Library"}))];
/// client.bulk_index("libraries", &documents).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchEngineError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchEngineError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchEngineError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchEngineError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Ping the cluster.
    ///
    /// Building the client performs no I/O, so this is what tells whether the node
    /// is reachable.
    pub async fn check_connection(&self) -> Result<(), SearchEngineError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchEngineError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchEngineError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    /// Build the NDJSON lines of a bulk request, one action line per document
    /// followed by its source line.
    ///
    /// `update` actions wrap the source in a `doc_as_upsert` partial document.
    fn bulk_lines(action: &str, documents: &[IndexDocument]) -> Vec<Value> {
        let mut lines = Vec::with_capacity(documents.len() * 2);

        for document in documents {
            lines.push(json!({ action: { "_id": document.id } }));
            if action == "update" {
                lines.push(json!({ "doc": document.body, "doc_as_upsert": true }));
            } else {
                lines.push(document.body.clone());
            }
        }

        lines
    }

    /// Turn a bulk response body into a summary.
    ///
    /// Only items carrying an `error` object count as failed.
    fn summarize_bulk_response(action: &str, total: usize, body: &Value) -> BulkOperationSummary {
        let has_errors = body
            .get("errors")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !has_errors {
            return BulkOperationSummary::all_succeeded(total);
        }

        let failures: Vec<BulkItemFailure> = body
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let result = item.get(action)?;
                        let error = result.get("error")?;
                        Some(BulkItemFailure {
                            id: result
                                .get("_id")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            reason: error
                                .get("reason")
                                .and_then(Value::as_str)
                                .map(str::to_string)
                                .unwrap_or_else(|| error.to_string()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let failed = failures.len();
        BulkOperationSummary {
            total,
            succeeded: total.saturating_sub(failed),
            failed,
            failures,
        }
    }

    /// Send a bulk request and summarize the response.
    async fn send_bulk(
        &self,
        index: &str,
        action: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkOperationSummary, SearchEngineError> {
        if documents.is_empty() {
            return Ok(BulkOperationSummary::default());
        }

        let body: Vec<JsonBody<Value>> = Self::bulk_lines(action, documents)
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchEngineError::bulk(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchEngineError::bulk(format!(
                "Bulk {} failed with status {}: {}",
                action, status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchEngineError::parse(e.to_string()))?;

        let summary = Self::summarize_bulk_response(action, documents.len(), &response_body);
        debug!(
            index = %index,
            action = action,
            total = summary.total,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }

    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchEngineError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchEngineError::index_lookup(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchEngineError::index_lookup(format!(
                "Index exists check for '{}' returned status {}",
                index, status
            ))),
        }
    }

    async fn create_index(&self, index: &str, mappings: &Value) -> Result<(), SearchEngineError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(mappings.clone())
            .send()
            .await
            .map_err(|e| SearchEngineError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %error_body, "Create index failed");
            return Err(SearchEngineError::index_creation(format!(
                "Create index '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Index created");
        Ok(())
    }

    /// Delete an index. A missing index is not an error.
    async fn delete_index(&self, index: &str) -> Result<(), SearchEngineError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchEngineError::index_deletion(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            warn!(index = %index, "Index to delete does not exist");
            return Ok(());
        }
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %error_body, "Delete index failed");
            return Err(SearchEngineError::index_deletion(format!(
                "Delete index '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Index deleted");
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkOperationSummary, SearchEngineError> {
        self.send_bulk(index, "index", documents).await
    }

    /// Uses `doc_as_upsert` so that the document is created if it doesn't exist.
    async fn partial_update(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<(), SearchEngineError> {
        let response = self
            .client
            .update(UpdateParts::IndexId(index, id))
            .body(json!({
                "doc": doc,
                "doc_as_upsert": true
            }))
            .send()
            .await
            .map_err(|e| SearchEngineError::update(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Update request failed");
            return Err(SearchEngineError::update(format!(
                "Update failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %id, "Document updated/created");
        Ok(())
    }

    async fn bulk_update(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkOperationSummary, SearchEngineError> {
        self.send_bulk(index, "update", documents).await
    }

    /// Delete documents by query. A missing index deletes nothing.
    async fn delete_by_query(&self, index: &str, query: &Value) -> Result<u64, SearchEngineError> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[index]))
            .body(query.clone())
            .send()
            .await
            .map_err(|e| SearchEngineError::delete_by_query(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            warn!(index = %index, "Delete by query on a missing index");
            return Ok(0);
        }
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %error_body, "Delete by query failed");
            return Err(SearchEngineError::delete_by_query(format!(
                "Delete by query failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchEngineError::parse(e.to_string()))?;
        let deleted = response_body
            .get("deleted")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        debug!(index = %index, deleted = deleted, "Documents deleted by query");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents() -> Vec<IndexDocument> {
        vec![
            IndexDocument::new("site_parks_1", json!({ "title": "Rose garden" })),
            IndexDocument::new("site_parks_2", json!({ "title": "Botanical garden" })),
        ]
    }

    #[test]
    fn test_index_bulk_lines() {
        let lines = OpenSearchClient::bulk_lines("index", &documents());

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], json!({ "index": { "_id": "site_parks_1" } }));
        assert_eq!(lines[1], json!({ "title": "Rose garden" }));
        assert_eq!(lines[2], json!({ "index": { "_id": "site_parks_2" } }));
    }

    #[test]
    fn test_update_bulk_lines_use_doc_as_upsert() {
        let lines = OpenSearchClient::bulk_lines("update", &documents());

        assert_eq!(lines[0], json!({ "update": { "_id": "site_parks_1" } }));
        assert_eq!(
            lines[1],
            json!({ "doc": { "title": "Rose garden" }, "doc_as_upsert": true })
        );
    }

    #[test]
    fn test_summarize_response_without_errors() {
        let body = json!({ "took": 3, "errors": false, "items": [] });
        let summary = OpenSearchClient::summarize_bulk_response("index", 2, &body);

        assert_eq!(summary, BulkOperationSummary::all_succeeded(2));
    }

    #[test]
    fn test_summarize_response_with_item_errors() {
        let body = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_id": "site_parks_1", "status": 201 } },
                { "index": {
                    "_id": "site_parks_2",
                    "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [timestamp]" }
                } }
            ]
        });
        let summary = OpenSearchClient::summarize_bulk_response("index", 2, &body);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].id, "site_parks_2");
        assert_eq!(summary.failures[0].reason, "failed to parse field [timestamp]");
    }

    #[test]
    fn test_summarize_response_ignores_other_actions() {
        let body = json!({
            "errors": true,
            "items": [
                { "update": { "_id": "a", "error": { "reason": "document missing" } } }
            ]
        });
        let summary = OpenSearchClient::summarize_bulk_response("index", 1, &body);

        assert_eq!(summary.failed, 0);
        assert_eq!(summary.succeeded, 1);
    }
}
