//! Interface definitions for the external collaborators of the sync engine.
//!
//! `SearchEngineClient` abstracts the search backend and `ChangeQueueRepository`
//! abstracts the store holding pending changes. Both allow dependency injection
//! and testing with mock implementations.

mod change_queue_repository;
mod search_engine_client;

pub use change_queue_repository::ChangeQueueRepository;
pub use search_engine_client::SearchEngineClient;
