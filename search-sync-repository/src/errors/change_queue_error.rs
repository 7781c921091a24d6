use thiserror::Error;

/// Errors that can occur within the change-queue store.
///
/// Consolidates database failures, migration failures and rows whose persisted
/// task code is not a known `IndexerTask`.
#[derive(Debug, Error)]
pub enum ChangeQueueError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid task code: {0}")]
    InvalidTask(i16),
}
