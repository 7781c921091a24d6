//! Utility functions for the search sync repository.

use serde_json::{json, Value};

/// Build a query matching documents by search-engine id.
///
/// # Example
///
/// ```
/// use search_sync_repository::ids_query;
///
/// let query = ids_query(&["site_parks_1".to_string()]);
/// assert_eq!(query["query"]["terms"]["_id"][0], "site_parks_1");
/// ```
pub fn ids_query(ids: &[String]) -> Value {
    json!({
        "query": {
            "terms": {
                "_id": ids
            }
        }
    })
}
