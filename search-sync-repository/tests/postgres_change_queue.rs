//! Integration tests for the PostgreSQL change queue.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test --test postgres_change_queue -- --ignored`

use search_sync_repository::{ChangeQueueRepository, EnqueueOutcome, PostgresChangeQueue};
use search_sync_shared::IndexerTask;

const LIBRARIES: &str = "libraries";
const PARKS: &str = "parks";

// ============================================================================
// Merge Rule Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_enqueue_inserts_one_row_per_resource(pool: sqlx::PgPool) {
    let queue = PostgresChangeQueue::new(pool.clone());

    let first = queue.enqueue(LIBRARIES, "1", IndexerTask::Create).await.unwrap();
    let second = queue.enqueue(LIBRARIES, "1", IndexerTask::Create).await.unwrap();

    assert_eq!(first, EnqueueOutcome::Inserted);
    assert_eq!(second, EnqueueOutcome::Unchanged);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM indexer_action")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_create_then_delete_cancels(pool: sqlx::PgPool) {
    let queue = PostgresChangeQueue::new(pool);

    queue.enqueue(LIBRARIES, "1", IndexerTask::Create).await.unwrap();
    let outcome = queue.enqueue(LIBRARIES, "1", IndexerTask::Delete).await.unwrap();

    assert_eq!(outcome, EnqueueOutcome::Cancelled);
    assert_eq!(queue.count(LIBRARIES).await.unwrap(), 0);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_modify_then_delete_overwrites(pool: sqlx::PgPool) {
    let queue = PostgresChangeQueue::new(pool.clone());

    queue.enqueue(LIBRARIES, "1", IndexerTask::Modify).await.unwrap();
    let outcome = queue.enqueue(LIBRARIES, "1", IndexerTask::Delete).await.unwrap();

    assert_eq!(outcome, EnqueueOutcome::Overwritten);

    let task: i16 = sqlx::query_scalar(
        "SELECT id_task FROM indexer_action WHERE id_datasource = $1 AND id_resource = $2",
    )
    .bind(LIBRARIES)
    .bind("1")
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(task, IndexerTask::Delete.code());
}

// ============================================================================
// Drain / Remove Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_drain_is_ordered_and_non_destructive(pool: sqlx::PgPool) {
    let queue = PostgresChangeQueue::new(pool);
    for id in ["30", "10", "20"] {
        queue.enqueue(LIBRARIES, id, IndexerTask::Create).await.unwrap();
    }
    queue.enqueue(LIBRARIES, "40", IndexerTask::Modify).await.unwrap();

    let created = queue.drain(LIBRARIES, IndexerTask::Create).await.unwrap();
    let again = queue.drain(LIBRARIES, IndexerTask::Create).await.unwrap();

    assert_eq!(created, vec!["30", "10", "20"]);
    assert_eq!(again, created);
    assert_eq!(
        queue.drain(LIBRARIES, IndexerTask::Modify).await.unwrap(),
        vec!["40"]
    );
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_remove_only_touches_its_data_source(pool: sqlx::PgPool) {
    let queue = PostgresChangeQueue::new(pool);
    queue.enqueue(LIBRARIES, "1", IndexerTask::Create).await.unwrap();
    queue.enqueue(LIBRARIES, "2", IndexerTask::Delete).await.unwrap();
    queue.enqueue(PARKS, "1", IndexerTask::Create).await.unwrap();

    let removed = queue
        .remove(LIBRARIES, &["1".to_string(), "2".to_string()])
        .await
        .unwrap();

    assert_eq!(removed, 2);
    assert!(queue.list(LIBRARIES).await.unwrap().is_empty());

    let parks = queue.list(PARKS).await.unwrap();
    assert_eq!(parks.len(), 1);
    assert_eq!(parks[0].id_resource, "1");
    assert_eq!(parks[0].task, IndexerTask::Create);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires a PostgreSQL database"]
async fn test_remove_with_no_ids(pool: sqlx::PgPool) {
    let queue = PostgresChangeQueue::new(pool);
    queue.enqueue(LIBRARIES, "1", IndexerTask::Create).await.unwrap();

    assert_eq!(queue.remove(LIBRARIES, &[]).await.unwrap(), 0);
    assert_eq!(queue.count(LIBRARIES).await.unwrap(), 1);
}
