//! Configuration and dependency initialization.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{ConnectionMode, SyncConfig, SyncMode};
