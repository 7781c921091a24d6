//! Dependency initialization and wiring for the sync engine.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::{ConnectionMode, SyncConfig};
use crate::engine::SyncEngine;
use crate::source::{DataSourceRegistry, StaticDataSource};
use crate::IndexingError;
use search_sync_repository::{
    ChangeQueueRepository, InMemoryChangeQueue, OpenSearchClient, PostgresChangeQueue,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configuration the dependencies were built from.
    pub config: SyncConfig,
    /// The configured engine ready to run.
    pub engine: SyncEngine,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`SyncConfig::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the configuration is invalid, a data-source
    ///   manifest cannot be loaded, the database is unreachable, or OpenSearch is
    ///   unreachable in fail-fast mode
    pub async fn new() -> Result<Self, IndexingError> {
        let config = SyncConfig::from_env()?;
        Self::from_config(config).await
    }

    /// Initialize all dependencies from an explicit configuration.
    pub async fn from_config(config: SyncConfig) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %config.opensearch_url,
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            instance_name = %config.instance_name,
            default_batch_size = config.default_batch_size,
            mode = ?config.mode,
            "Initializing dependencies"
        );

        let registry = Self::load_registry(&config)?;

        let search = Self::connect_to_opensearch(
            &config.opensearch_url,
            config.connection_mode,
            config.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        let queue = Self::connect_change_queue(config.database_url.as_deref()).await?;

        let engine = SyncEngine::new(
            registry,
            Arc::new(search),
            queue,
            config.instance_name.clone(),
        );

        Ok(Self { config, engine })
    }

    /// Build the data-source registry from the manifest directory, if any.
    fn load_registry(config: &SyncConfig) -> Result<DataSourceRegistry, IndexingError> {
        let mut registry = DataSourceRegistry::new(config.default_batch_size)?;

        match &config.data_sources_dir {
            Some(dir) => {
                for source in StaticDataSource::load_dir(dir)? {
                    registry.register(Arc::new(source))?;
                }
            }
            None => warn!("SYNC_DATA_SOURCES_DIR is not set, no data source registered"),
        }

        info!(data_sources = registry.len(), "Data sources loaded");
        Ok(registry)
    }

    /// Connect to the change-queue store.
    async fn connect_change_queue(
        database_url: Option<&str>,
    ) -> Result<Arc<dyn ChangeQueueRepository>, IndexingError> {
        match database_url {
            Some(url) => {
                let queue = PostgresChangeQueue::connect(url).await.map_err(|e| {
                    IndexingError::config(format!("Failed to connect to the database: {}", e))
                })?;
                Ok(Arc::new(queue))
            }
            None => {
                warn!("DATABASE_URL is not set, pending changes are kept in memory only");
                Ok(Arc::new(InMemoryChangeQueue::new()))
            }
        }
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchClient, IndexingError> {
        loop {
            match Self::try_connect_opensearch(url).await {
                Ok(client) => return Ok(client),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch.
    async fn try_connect_opensearch(url: &str) -> Result<OpenSearchClient, IndexingError> {
        let client = OpenSearchClient::new(url).await.map_err(|e| {
            IndexingError::config(format!("Failed to create OpenSearch client: {}", e))
        })?;

        client.check_connection().await.map_err(|e| {
            IndexingError::config(format!("OpenSearch is not reachable: {}", e))
        })?;

        Ok(client)
    }
}
