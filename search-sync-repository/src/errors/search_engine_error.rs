//! Search engine error types.
//!
//! This module defines the error type returned by every `SearchEngineClient`
//! operation. Callers treat all variants as a single failure kind; the variants
//! exist so that logs say which call failed.

use thiserror::Error;

/// Errors from search engine operations.
#[derive(Debug, Clone, Error)]
pub enum SearchEngineError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to delete an index.
    #[error("Index deletion error: {0}")]
    IndexDeletionError(String),

    /// Failed to check whether an index exists.
    #[error("Index lookup error: {0}")]
    IndexLookupError(String),

    /// A bulk request was rejected as a whole.
    #[error("Bulk error: {0}")]
    BulkError(String),

    /// Failed to update a document.
    #[error("Update error: {0}")]
    UpdateError(String),

    /// Failed to delete documents by query.
    #[error("Delete by query error: {0}")]
    DeleteByQueryError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize a request body.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchEngineError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an index deletion error.
    pub fn index_deletion(msg: impl Into<String>) -> Self {
        Self::IndexDeletionError(msg.into())
    }

    /// Create an index lookup error.
    pub fn index_lookup(msg: impl Into<String>) -> Self {
        Self::IndexLookupError(msg.into())
    }

    /// Create a bulk error.
    pub fn bulk(msg: impl Into<String>) -> Self {
        Self::BulkError(msg.into())
    }

    /// Create an update error.
    pub fn update(msg: impl Into<String>) -> Self {
        Self::UpdateError(msg.into())
    }

    /// Create a delete-by-query error.
    pub fn delete_by_query(msg: impl Into<String>) -> Self {
        Self::DeleteByQueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }
}
