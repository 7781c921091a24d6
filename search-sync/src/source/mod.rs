//! Data source contract.
//!
//! Every pluggable source of records implements [`DataSource`]. The engine only
//! enumerates ids, fetches objects by id and reads static configuration; it never
//! knows how a source talks to its upstream system.

mod registry;
mod static_source;

use std::sync::Arc;

use async_trait::async_trait;
use search_sync_shared::DataObject;
use serde_json::Value;

use crate::errors::FetchError;

pub use registry::DataSourceRegistry;
pub use static_source::{DataSourceManifest, StaticDataSource};

/// Document type used when a data source does not declare one.
pub const DEFAULT_DATA_TYPE: &str = "_doc";

/// A collection of records mirrored into one target index.
///
/// Static configuration is read-only during a run.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Unique identifier, also part of every document id.
    fn id(&self) -> &str;

    /// Display name, used in status logs.
    fn name(&self) -> &str;

    fn target_index_name(&self) -> &str;

    fn data_type(&self) -> &str {
        DEFAULT_DATA_TYPE
    }

    /// Number of ids fetched per call.
    ///
    /// `None` or `Some(0)` falls back to the engine default.
    fn batch_size(&self) -> Option<usize> {
        None
    }

    /// Create-index body replacing the default mappings.
    fn mappings(&self) -> Option<Value> {
        None
    }

    /// Whether objects carry a geo-point `location`.
    fn localizable(&self) -> bool {
        false
    }

    /// Whether scheduled full reindex sweeps include this source.
    fn uses_full_indexing_daemon(&self) -> bool {
        false
    }

    /// Enrichment hooks run on every batch before dispatch.
    fn external_attribute_providers(&self) -> Vec<Arc<dyn ExternalAttributeProvider>> {
        Vec::new()
    }

    /// Every resource id, in the order full indexing walks them.
    async fn list_resource_ids(&self) -> Result<Vec<String>, FetchError>;

    /// Fetch the objects for `ids`.
    ///
    /// Ids with no record are omitted from the result. The result order need not
    /// match `ids`.
    async fn fetch_objects(&self, ids: &[String]) -> Result<Vec<DataObject>, FetchError>;
}

/// Post-fetch enrichment of data objects.
///
/// Providers may add or overwrite attributes but must leave `id` untouched.
#[async_trait]
pub trait ExternalAttributeProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Enrich a single object.
    async fn provide_attributes(&self, object: &mut DataObject) -> Result<(), FetchError>;

    /// Enrich a whole batch.
    ///
    /// The default enriches objects one at a time. Providers backed by a remote
    /// system should override it with a single lookup.
    async fn provide_batch_attributes(&self, objects: &mut [DataObject]) -> Result<(), FetchError> {
        for object in objects.iter_mut() {
            self.provide_attributes(object).await?;
        }
        Ok(())
    }
}
