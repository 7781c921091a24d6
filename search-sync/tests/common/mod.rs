//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use search_sync::source::{DataSource, ExternalAttributeProvider, StaticDataSource};
use search_sync::status::IndexingStatus;
use search_sync::FetchError;
use search_sync_repository::{
    BulkOperationSummary, IndexDocument, SearchEngineClient, SearchEngineError,
};
use search_sync_shared::DataObject;
use serde_json::Value;
use tokio::sync::Notify;

pub const INSTANCE: &str = "site";

// Mock search engine keeping documents in memory
#[derive(Default)]
pub struct MockSearchEngine {
    indices: Mutex<HashMap<String, HashMap<String, Value>>>,
    calls: Mutex<Vec<String>>,
    mappings: Mutex<Vec<Value>>,
    pub fail_writes: AtomicBool,
}

impl MockSearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock where `index` already exists.
    pub fn with_index(index: &str) -> Self {
        let engine = Self::new();
        engine
            .indices
            .lock()
            .unwrap()
            .insert(index.to_string(), HashMap::new());
        engine
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(':').next() == Some(operation))
            .count()
    }

    pub fn created_mappings(&self) -> Vec<Value> {
        self.mappings.lock().unwrap().clone()
    }

    pub fn documents(&self, index: &str) -> HashMap<String, Value> {
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, index: &str, id: &str, body: Value) {
        self.indices
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), body);
    }

    fn record(&self, operation: &str, index: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", operation, index));
    }

    fn check_writes(&self) -> Result<(), SearchEngineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(SearchEngineError::bulk("mock write failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SearchEngineClient for MockSearchEngine {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchEngineError> {
        self.record("index_exists", index);
        let exists = self.indices.lock().unwrap().contains_key(index);
        // Lets concurrent runs interleave between the check and the answer.
        tokio::task::yield_now().await;
        Ok(exists)
    }

    async fn create_index(&self, index: &str, mappings: &Value) -> Result<(), SearchEngineError> {
        self.record("create_index", index);
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(index) {
            return Err(SearchEngineError::index_creation("resource_already_exists_exception"));
        }
        indices.insert(index.to_string(), HashMap::new());
        self.mappings.lock().unwrap().push(mappings.clone());
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchEngineError> {
        self.record("delete_index", index);
        self.indices.lock().unwrap().remove(index);
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkOperationSummary, SearchEngineError> {
        self.record("bulk_index", index);
        self.check_writes()?;
        let mut indices = self.indices.lock().unwrap();
        let target = indices.entry(index.to_string()).or_default();
        for document in documents {
            target.insert(document.id.clone(), document.body.clone());
        }
        Ok(BulkOperationSummary::all_succeeded(documents.len()))
    }

    async fn partial_update(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<(), SearchEngineError> {
        self.record("partial_update", index);
        self.check_writes()?;
        let mut indices = self.indices.lock().unwrap();
        let target = indices.entry(index.to_string()).or_default();
        let existing = target
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if let (Some(existing), Some(fields)) = (existing.as_object_mut(), doc.as_object()) {
            for (key, value) in fields {
                existing.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete_by_query(&self, index: &str, query: &Value) -> Result<u64, SearchEngineError> {
        self.record("delete_by_query", index);
        self.check_writes()?;
        let ids: Vec<String> = query["query"]["terms"]["_id"]
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| id.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let mut indices = self.indices.lock().unwrap();
        let Some(target) = indices.get_mut(index) else {
            return Ok(0);
        };
        Ok(ids.iter().filter(|id| target.remove(*id).is_some()).count() as u64)
    }
}

// Data source recording its fetch calls
pub struct RecordingDataSource {
    inner: StaticDataSource,
    fetch_calls: Mutex<Vec<Vec<String>>>,
    pub fail_fetch: AtomicBool,
    gate: Option<Arc<Notify>>,
    observed: Option<(Arc<IndexingStatus>, Mutex<Vec<u64>>)>,
}

impl RecordingDataSource {
    pub fn new(inner: StaticDataSource) -> Self {
        Self {
            inner,
            fetch_calls: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            gate: None,
            observed: None,
        }
    }

    /// Make every fetch wait for a notification on `gate`.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Record `status.current_indexed()` at every fetch.
    pub fn observing(mut self, status: Arc<IndexingStatus>) -> Self {
        self.observed = Some((status, Mutex::new(Vec::new())));
        self
    }

    pub fn inner(&self) -> &StaticDataSource {
        &self.inner
    }

    pub fn fetch_calls(&self) -> Vec<Vec<String>> {
        self.fetch_calls.lock().unwrap().clone()
    }

    pub fn observed_progress(&self) -> Vec<u64> {
        self.observed
            .as_ref()
            .map(|(_, values)| values.lock().unwrap().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataSource for RecordingDataSource {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn target_index_name(&self) -> &str {
        self.inner.target_index_name()
    }

    fn batch_size(&self) -> Option<usize> {
        self.inner.batch_size()
    }

    fn mappings(&self) -> Option<Value> {
        self.inner.mappings()
    }

    fn localizable(&self) -> bool {
        self.inner.localizable()
    }

    fn uses_full_indexing_daemon(&self) -> bool {
        self.inner.uses_full_indexing_daemon()
    }

    fn external_attribute_providers(&self) -> Vec<Arc<dyn ExternalAttributeProvider>> {
        self.inner.external_attribute_providers()
    }

    async fn list_resource_ids(&self) -> Result<Vec<String>, FetchError> {
        self.inner.list_resource_ids().await
    }

    async fn fetch_objects(&self, ids: &[String]) -> Result<Vec<DataObject>, FetchError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some((status, values)) = &self.observed {
            values.lock().unwrap().push(status.current_indexed());
        }
        self.fetch_calls.lock().unwrap().push(ids.to_vec());

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(FetchError::unreachable("mock upstream down"));
        }
        self.inner.fetch_objects(ids).await
    }
}

/// A static data source with objects `1..=count`, titled "Object <id>".
pub fn numbered_source(id: &str, index: &str, count: usize) -> StaticDataSource {
    StaticDataSource::new(id, id, index).with_objects(
        (1..=count)
            .map(|n| DataObject::new(n.to_string()).with_attribute("title", format!("Object {}", n)))
            .collect(),
    )
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn document_id(data_source_id: &str, resource_id: &str) -> String {
    format!("{}_{}_{}", INSTANCE, data_source_id, resource_id)
}
