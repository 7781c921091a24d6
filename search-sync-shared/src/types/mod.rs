//! This module defines the core data structures and types used across the search sync engine.
//! It re-exports `DataObject`, `IndexerAction`, `IndexerTask` and `IndexingStatusSnapshot`.

pub mod data_object;
pub mod indexer_action;
pub mod indexing_status;

pub use data_object::DataObject;
pub use indexer_action::{IndexerAction, IndexerTask};
pub use indexing_status::IndexingStatusSnapshot;
