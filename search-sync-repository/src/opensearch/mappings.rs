//! OpenSearch index mappings.
//!
//! This module defines the default create-index body used when a data source does
//! not provide its own mappings.

use serde_json::{json, Map, Value};

/// Field holding the data object timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Field holding the geo point of localizable data objects.
pub const LOCATION_FIELD: &str = "location";

/// Accepted formats of the timestamp field.
pub const TIMESTAMP_FORMAT: &str = "yyyy-MM-dd HH:mm:ss||yyyy-MM-dd||epoch_millis";

/// Get the default create-index body for a data source.
///
/// The configuration declares:
/// - **timestamp**: a `date` accepting datetime strings, dates and epoch millis
/// - **location**: a `geo_point`, only when `localizable` is true
///
/// Every other field is left to dynamic mapping.
///
/// # Arguments
///
/// * `localizable` - Whether the data source's objects carry a location
pub fn default_mappings(localizable: bool) -> Value {
    let mut properties = Map::new();
    properties.insert(
        TIMESTAMP_FIELD.to_string(),
        json!({
            "type": "date",
            "format": TIMESTAMP_FORMAT
        }),
    );
    if localizable {
        properties.insert(LOCATION_FIELD.to_string(), json!({ "type": "geo_point" }));
    }

    json!({
        "mappings": {
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mappings_declare_timestamp_as_date() {
        let mappings = default_mappings(false);

        let timestamp = &mappings["mappings"]["properties"]["timestamp"];
        assert_eq!(timestamp["type"], "date");
        assert_eq!(timestamp["format"], TIMESTAMP_FORMAT);
        assert!(mappings["mappings"]["properties"]["location"].is_null());
    }

    #[test]
    fn test_localizable_mappings_add_geo_point() {
        let mappings = default_mappings(true);

        assert_eq!(
            mappings["mappings"]["properties"]["location"]["type"],
            "geo_point"
        );
        assert_eq!(mappings["mappings"]["properties"]["timestamp"]["type"], "date");
    }
}
