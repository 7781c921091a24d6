//! # Search Sync Shared
//!
//! This crate defines the data structures shared across the search sync engine:
//! the data objects produced by data sources, the change-queue rows that record
//! pending mutations, and the indexing status snapshots read by progress observers.

pub mod types;

pub use types::data_object::DataObject;
pub use types::indexer_action::{IndexerAction, IndexerTask};
pub use types::indexing_status::IndexingStatusSnapshot;
