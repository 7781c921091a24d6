//! Error types for the search sync repository.
//!
//! One error family per external collaborator: the search engine and the
//! change-queue store.

mod change_queue_error;
mod search_engine_error;

pub use change_queue_error::ChangeQueueError;
pub use search_engine_error::SearchEngineError;
