//! PostgreSQL implementation of the change queue.
//!
//! Stores pending changes in the `indexer_action` table. A unique index on
//! `(id_datasource, id_resource)` keeps at most one row per resource.

use async_trait::async_trait;
use search_sync_shared::{IndexerAction, IndexerTask};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::ChangeQueueError;
use crate::interfaces::ChangeQueueRepository;
use crate::types::EnqueueOutcome;

const MAX_CONNECTIONS: u32 = 5;

/// PostgreSQL-backed change queue.
pub struct PostgresChangeQueue {
    /// PostgreSQL connection pool
    pool: PgPool,
}

impl PostgresChangeQueue {
    /// Creates a change queue on an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool with the `indexer_action` table
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and applies pending migrations.
    ///
    /// # Arguments
    ///
    /// * `url` - PostgreSQL connection string
    pub async fn connect(url: &str) -> Result<Self, ChangeQueueError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;

        let queue = Self::new(pool);
        queue.migrate().await?;

        info!("Connected to the change-queue database");
        Ok(queue)
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> Result<(), ChangeQueueError> {
        sqlx::migrate!("./src/postgres/migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn decode_task(code: i16) -> Result<IndexerTask, ChangeQueueError> {
        IndexerTask::from_code(code).ok_or(ChangeQueueError::InvalidTask(code))
    }
}

#[async_trait]
impl ChangeQueueRepository for PostgresChangeQueue {
    async fn enqueue(
        &self,
        data_source_id: &str,
        resource_id: &str,
        task: IndexerTask,
    ) -> Result<EnqueueOutcome, ChangeQueueError> {
        let mut tx = self.pool.begin().await?;

        let pending: Option<i16> = sqlx::query_scalar(
            "SELECT id_task FROM indexer_action WHERE id_datasource = $1 AND id_resource = $2 FOR UPDATE",
        )
        .bind(data_source_id)
        .bind(resource_id)
        .fetch_optional(&mut *tx)
        .await?;
        let pending = pending.map(Self::decode_task).transpose()?;

        let mut outcome = EnqueueOutcome::resolve(pending, task);
        match outcome {
            EnqueueOutcome::Inserted => {
                let inserted = sqlx::query(
                    "INSERT INTO indexer_action (id_resource, id_task, id_datasource) VALUES ($1, $2, $3) ON CONFLICT (id_datasource, id_resource) DO NOTHING",
                )
                .bind(resource_id)
                .bind(task.code())
                .bind(data_source_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                // A concurrent enqueue inserted the row first.
                if inserted == 0 {
                    outcome = EnqueueOutcome::Unchanged;
                }
            }
            EnqueueOutcome::Cancelled => {
                sqlx::query(
                    "DELETE FROM indexer_action WHERE id_datasource = $1 AND id_resource = $2",
                )
                .bind(data_source_id)
                .bind(resource_id)
                .execute(&mut *tx)
                .await?;
            }
            EnqueueOutcome::Overwritten => {
                sqlx::query(
                    "UPDATE indexer_action SET id_task = $3 WHERE id_datasource = $1 AND id_resource = $2",
                )
                .bind(data_source_id)
                .bind(resource_id)
                .bind(task.code())
                .execute(&mut *tx)
                .await?;
            }
            EnqueueOutcome::Unchanged => {}
        }

        tx.commit().await?;

        debug!(
            data_source = %data_source_id,
            resource_id = %resource_id,
            task = %task,
            outcome = ?outcome,
            "Change enqueued"
        );
        Ok(outcome)
    }

    async fn drain(
        &self,
        data_source_id: &str,
        task: IndexerTask,
    ) -> Result<Vec<String>, ChangeQueueError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id_resource FROM indexer_action WHERE id_datasource = $1 AND id_task = $2 ORDER BY id",
        )
        .bind(data_source_id)
        .bind(task.code())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn remove(
        &self,
        data_source_id: &str,
        resource_ids: &[String],
    ) -> Result<u64, ChangeQueueError> {
        if resource_ids.is_empty() {
            return Ok(0);
        }

        let removed = sqlx::query(
            "DELETE FROM indexer_action WHERE id_datasource = $1 AND id_resource = ANY($2)",
        )
        .bind(data_source_id)
        .bind(resource_ids)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(removed)
    }

    async fn list(&self, data_source_id: &str) -> Result<Vec<IndexerAction>, ChangeQueueError> {
        let rows: Vec<(i64, String, i16, String)> = sqlx::query_as(
            "SELECT id, id_resource, id_task, id_datasource FROM indexer_action WHERE id_datasource = $1 ORDER BY id",
        )
        .bind(data_source_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, id_resource, id_task, id_data_source)| {
                Ok(IndexerAction {
                    id,
                    id_resource,
                    id_data_source,
                    task: Self::decode_task(id_task)?,
                })
            })
            .collect()
    }

    async fn count(&self, data_source_id: &str) -> Result<u64, ChangeQueueError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM indexer_action WHERE id_datasource = $1")
                .bind(data_source_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }
}
