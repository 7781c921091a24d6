//! Registry of the data sources known to the engine.

use std::sync::Arc;

use tracing::info;

use super::DataSource;
use crate::errors::SyncError;

/// Data sources looked up by id, kept in registration order.
///
/// Built once at startup and shared with the engine. Registration validates the
/// static configuration so that configuration errors never surface mid-run.
pub struct DataSourceRegistry {
    sources: Vec<Arc<dyn DataSource>>,
    default_batch_size: usize,
}

impl DataSourceRegistry {
    /// Create an empty registry.
    ///
    /// # Arguments
    ///
    /// * `default_batch_size` - Batch size of data sources declaring none
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if `default_batch_size` is 0.
    pub fn new(default_batch_size: usize) -> Result<Self, SyncError> {
        if default_batch_size == 0 {
            return Err(SyncError::configuration(
                "Default batch size must be at least 1",
            ));
        }

        Ok(Self {
            sources: Vec::new(),
            default_batch_size,
        })
    }

    /// Register a data source.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if the id or the target index name is
    /// empty, or if the id is already registered.
    pub fn register(&mut self, source: Arc<dyn DataSource>) -> Result<(), SyncError> {
        if source.id().trim().is_empty() {
            return Err(SyncError::configuration("Data source id is empty"));
        }
        if source.target_index_name().trim().is_empty() {
            return Err(SyncError::configuration(format!(
                "Data source '{}' has no target index name",
                source.id()
            )));
        }
        if self.get(source.id()).is_some() {
            return Err(SyncError::configuration(format!(
                "Data source '{}' is registered twice",
                source.id()
            )));
        }

        info!(
            data_source_id = %source.id(),
            target_index = %source.target_index_name(),
            batch_size = self.batch_size_for(source.as_ref()),
            "Data source registered"
        );
        self.sources.push(source);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn DataSource>> {
        self.sources
            .iter()
            .find(|source| source.id() == id)
            .cloned()
    }

    /// Like [`DataSourceRegistry::get`], failing with `UnknownDataSource`.
    pub fn require(&self, id: &str) -> Result<Arc<dyn DataSource>, SyncError> {
        self.get(id)
            .ok_or_else(|| SyncError::unknown_data_source(id))
    }

    /// Every data source, in registration order.
    pub fn all(&self) -> &[Arc<dyn DataSource>] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn default_batch_size(&self) -> usize {
        self.default_batch_size
    }

    /// Effective batch size of a data source.
    pub fn batch_size_for(&self, source: &dyn DataSource) -> usize {
        source
            .batch_size()
            .filter(|size| *size >= 1)
            .unwrap_or(self.default_batch_size)
    }
}
