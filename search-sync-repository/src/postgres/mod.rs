//! PostgreSQL implementation of the change-queue store.

mod change_queue;

pub use change_queue::PostgresChangeQueue;
