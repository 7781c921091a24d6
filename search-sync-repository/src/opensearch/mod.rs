//! OpenSearch implementation of the search engine client.
//!
//! This module provides a concrete implementation of `SearchEngineClient`
//! using OpenSearch as the backend, and the default index mappings.

mod client;
mod mappings;

pub use client::OpenSearchClient;
pub use mappings::{default_mappings, LOCATION_FIELD, TIMESTAMP_FIELD, TIMESTAMP_FORMAT};
