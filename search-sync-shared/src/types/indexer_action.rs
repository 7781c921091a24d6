//! Change-queue row types.
//!
//! An `IndexerAction` records one pending mutation of a data-source record that
//! the incremental sync has not yet applied to the search index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of mutation recorded in the change queue.
///
/// The numeric codes are the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexerTask {
    Create,
    Modify,
    Delete,
}

impl IndexerTask {
    /// Every task kind, in the order the incremental sync drains them.
    pub const ALL: [IndexerTask; 3] = [IndexerTask::Create, IndexerTask::Modify, IndexerTask::Delete];

    /// Persisted code of the task.
    pub fn code(self) -> i16 {
        match self {
            IndexerTask::Create => 1,
            IndexerTask::Modify => 2,
            IndexerTask::Delete => 3,
        }
    }

    /// Parse a persisted task code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(IndexerTask::Create),
            2 => Some(IndexerTask::Modify),
            3 => Some(IndexerTask::Delete),
            _ => None,
        }
    }

    /// Lowercase name, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            IndexerTask::Create => "create",
            IndexerTask::Modify => "modify",
            IndexerTask::Delete => "delete",
        }
    }
}

impl fmt::Display for IndexerTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending change-queue row.
///
/// At most one row exists per `(id_data_source, id_resource)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerAction {
    /// Store-assigned, monotonic identifier.
    pub id: i64,
    /// Upstream record id, before namespacing.
    pub id_resource: String,
    /// Owning data source.
    pub id_data_source: String,
    pub task: IndexerTask,
}
