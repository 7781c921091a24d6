//! In-memory data source, optionally loaded from a JSON manifest.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use search_sync_shared::DataObject;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{DataSource, ExternalAttributeProvider, DEFAULT_DATA_TYPE};
use crate::errors::{FetchError, SyncError};

/// JSON manifest describing a [`StaticDataSource`].
///
/// ```json
/// {
///   "id": "parks",
///   "name": "City parks",
///   "target_index_name": "city",
///   "batch_size": 500,
///   "localizable": true,
///   "uses_full_indexing_daemon": true,
///   "objects": [{ "id": "1", "title": "Rose garden" }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceManifest {
    pub id: String,
    pub name: String,
    pub target_index_name: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub localizable: bool,
    #[serde(default)]
    pub uses_full_indexing_daemon: bool,
    #[serde(default)]
    pub mappings: Option<Value>,
    #[serde(default)]
    pub objects: Vec<DataObject>,
}

fn default_data_type() -> String {
    DEFAULT_DATA_TYPE.to_string()
}

/// Data source whose records live in process memory.
///
/// Records keep their insertion order, which is the full-index order.
pub struct StaticDataSource {
    id: String,
    name: String,
    target_index_name: String,
    data_type: String,
    batch_size: Option<usize>,
    localizable: bool,
    uses_full_indexing_daemon: bool,
    mappings: Option<Value>,
    providers: Vec<Arc<dyn ExternalAttributeProvider>>,
    objects: RwLock<Vec<DataObject>>,
}

impl StaticDataSource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_index_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_index_name: target_index_name.into(),
            data_type: default_data_type(),
            batch_size: None,
            localizable: false,
            uses_full_indexing_daemon: false,
            mappings: None,
            providers: Vec::new(),
            objects: RwLock::new(Vec::new()),
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_mappings(mut self, mappings: Value) -> Self {
        self.mappings = Some(mappings);
        self
    }

    pub fn with_localizable(mut self, localizable: bool) -> Self {
        self.localizable = localizable;
        self
    }

    pub fn with_full_indexing_daemon(mut self, enabled: bool) -> Self {
        self.uses_full_indexing_daemon = enabled;
        self
    }

    pub fn with_attribute_provider(mut self, provider: Arc<dyn ExternalAttributeProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_objects(self, objects: Vec<DataObject>) -> Self {
        for object in objects {
            self.upsert_object(object);
        }
        self
    }

    /// Build a data source from a parsed manifest.
    pub fn from_manifest(manifest: DataSourceManifest) -> Self {
        let mut source = Self::new(manifest.id, manifest.name, manifest.target_index_name)
            .with_data_type(manifest.data_type)
            .with_localizable(manifest.localizable)
            .with_full_indexing_daemon(manifest.uses_full_indexing_daemon)
            .with_objects(manifest.objects);
        source.batch_size = manifest.batch_size;
        source.mappings = manifest.mappings;
        source
    }

    /// Load a data source from a JSON manifest file.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let manifest: DataSourceManifest = serde_json::from_str(&content).map_err(|e| {
            SyncError::configuration(format!("Invalid manifest {}: {}", path.display(), e))
        })?;

        let source = Self::from_manifest(manifest);
        info!(
            data_source_id = %source.id,
            path = %path.display(),
            objects = source.len(),
            "Loaded data source manifest"
        );
        Ok(source)
    }

    /// Load every `*.json` manifest of a directory, sorted by file name.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<Self>, SyncError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            SyncError::configuration(format!("Cannot read {}: {}", dir.display(), e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| SyncError::configuration(e.to_string()))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(Self::from_json_file).collect()
    }

    /// Insert a record, replacing the one with the same id in place.
    pub fn upsert_object(&self, object: DataObject) {
        let mut objects = self.write_objects();
        match objects.iter_mut().find(|existing| existing.id == object.id) {
            Some(existing) => *existing = object,
            None => objects.push(object),
        }
    }

    /// Remove a record. Returns whether it existed.
    pub fn remove_object(&self, id: &str) -> bool {
        let mut objects = self.write_objects();
        let before = objects.len();
        objects.retain(|object| object.id != id);
        objects.len() != before
    }

    pub fn len(&self) -> usize {
        self.read_objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_objects().is_empty()
    }

    fn read_objects(&self) -> RwLockReadGuard<'_, Vec<DataObject>> {
        self.objects.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_objects(&self) -> RwLockWriteGuard<'_, Vec<DataObject>> {
        self.objects.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DataSource for StaticDataSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn target_index_name(&self) -> &str {
        &self.target_index_name
    }

    fn data_type(&self) -> &str {
        &self.data_type
    }

    fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }

    fn mappings(&self) -> Option<Value> {
        self.mappings.clone()
    }

    fn localizable(&self) -> bool {
        self.localizable
    }

    fn uses_full_indexing_daemon(&self) -> bool {
        self.uses_full_indexing_daemon
    }

    fn external_attribute_providers(&self) -> Vec<Arc<dyn ExternalAttributeProvider>> {
        self.providers.clone()
    }

    async fn list_resource_ids(&self) -> Result<Vec<String>, FetchError> {
        Ok(self
            .read_objects()
            .iter()
            .map(|object| object.id.clone())
            .collect())
    }

    async fn fetch_objects(&self, ids: &[String]) -> Result<Vec<DataObject>, FetchError> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let objects: Vec<DataObject> = self
            .read_objects()
            .iter()
            .filter(|object| wanted.contains(object.id.as_str()))
            .cloned()
            .collect();

        debug!(
            data_source_id = %self.id,
            requested = ids.len(),
            found = objects.len(),
            "Fetched objects"
        );
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn parks() -> StaticDataSource {
        StaticDataSource::new("parks", "City parks", "city").with_objects(vec![
            DataObject::new("1").with_attribute("title", "Rose garden"),
            DataObject::new("2").with_attribute("title", "Botanical garden"),
            DataObject::new("3").with_attribute("title", "Zoo"),
        ])
    }

    #[tokio::test]
    async fn test_fetch_omits_missing_ids() {
        let source = parks();

        let objects = source
            .fetch_objects(&["3".to_string(), "42".to_string(), "1".to_string()])
            .await
            .unwrap();

        let ids: Vec<&str> = objects.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place_and_remove() {
        let source = parks();
        source.upsert_object(DataObject::new("2").with_attribute("title", "Greenhouse"));
        source.upsert_object(DataObject::new("4"));

        assert!(source.remove_object("1"));
        assert!(!source.remove_object("1"));

        assert_eq!(source.list_resource_ids().await.unwrap(), vec!["2", "3", "4"]);
        let fetched = source.fetch_objects(&["2".to_string()]).await.unwrap();
        assert_eq!(fetched[0].attribute("title"), Some(&json!("Greenhouse")));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "id": "libraries",
                "name": "Libraries",
                "target_index_name": "city",
                "batch_size": 50,
                "localizable": true,
                "objects": [
                    { "id": "7", "title": "Central library" }
                ]
            })
        )
        .unwrap();

        let source = StaticDataSource::from_json_file(file.path()).unwrap();

        assert_eq!(source.id(), "libraries");
        assert_eq!(source.data_type(), DEFAULT_DATA_TYPE);
        assert_eq!(source.batch_size(), Some(50));
        assert!(source.localizable());
        assert!(!source.uses_full_indexing_daemon());
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_invalid_manifest_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"id\": \"broken\" }}").unwrap();

        assert!(matches!(
            StaticDataSource::from_json_file(file.path()),
            Err(SyncError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_dir_reads_only_json_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (file_name, id) in [("b.json", "parks"), ("a.json", "libraries")] {
            std::fs::write(
                dir.path().join(file_name),
                json!({ "id": id, "name": id, "target_index_name": "city" }).to_string(),
            )
            .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sources = StaticDataSource::load_dir(dir.path()).unwrap();

        let ids: Vec<&str> = sources.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["libraries", "parks"]);
    }
}
