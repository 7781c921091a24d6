//! # Search Sync Repository
//!
//! This crate provides traits and implementations for the external collaborators
//! of the sync engine: the search engine and the change-queue store. It includes
//! definitions for errors and interfaces, an OpenSearch client, a PostgreSQL
//! change queue and an in-memory change queue.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod postgres;
pub mod types;
pub mod utils;

pub use errors::{ChangeQueueError, SearchEngineError};
pub use interfaces::{ChangeQueueRepository, SearchEngineClient};
pub use memory::InMemoryChangeQueue;
pub use opensearch::{default_mappings, OpenSearchClient};
pub use postgres::PostgresChangeQueue;
pub use types::{BulkItemFailure, BulkOperationSummary, EnqueueOutcome, IndexDocument};
pub use utils::ids_query;
