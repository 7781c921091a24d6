//! Data object types for the search index.
//!
//! This module defines the record structure that data sources produce and that is
//! indexed in the search engine.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record produced by a data source, as presented to the search engine.
///
/// The `id` identifies the record inside its data source. It is never part of the
/// indexed document body: the engine namespaces it and uses the result as the
/// search-engine document id.
///
/// # Fields
///
/// - `id`: Record identifier within the data source
/// - `timestamp`: Optional epoch-millis timestamp, serialized as a string
/// - `day_of_week`, `month`, `hour`, `prefixed_day_of_week`, `prefixed_month`:
///   Values derived from `timestamp` by [`DataObject::set_timestamp`]
/// - `parent_id`, `parent_name`, `document_type_name`: Denormalized hierarchy fields
/// - `attributes`: Arbitrary source-specific fields, flattened into the document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataObject {
    #[serde(skip_serializing, default)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub day_of_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefixed_day_of_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefixed_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub document_type_name: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl DataObject {
    /// Create an empty data object with the given id.
    ///
    /// # Example
    ///
    /// ```
    /// use search_sync_shared::DataObject;
    ///
    /// let object = DataObject::new("42").with_attribute("title", "Opening hours");
    /// assert_eq!(object.id, "42");
    /// ```
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Builder-style variant of [`DataObject::set_attribute`].
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder-style variant of [`DataObject::set_timestamp`].
    pub fn with_timestamp(mut self, timestamp_millis: i64) -> Self {
        self.set_timestamp(timestamp_millis);
        self
    }

    /// Set the denormalized hierarchy fields.
    pub fn with_parent(
        mut self,
        parent_id: impl Into<String>,
        parent_name: impl Into<String>,
        document_type_name: impl Into<String>,
    ) -> Self {
        self.parent_id = Some(parent_id.into());
        self.parent_name = Some(parent_name.into());
        self.document_type_name = Some(document_type_name.into());
        self
    }

    /// Insert or overwrite an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Read an attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Set the timestamp and derive the calendar fields from it.
    ///
    /// Calendar fields are computed in UTC with English names. The prefixed day of
    /// week is Monday-first (`"1 - Monday"` .. `"7 - Sunday"`) so that a lexical
    /// sort in a dashboard follows the week. A timestamp outside chrono's range keeps
    /// only the raw value.
    pub fn set_timestamp(&mut self, timestamp_millis: i64) {
        self.timestamp = Some(timestamp_millis.to_string());

        let Some(moment) = DateTime::<Utc>::from_timestamp_millis(timestamp_millis) else {
            self.day_of_week = None;
            self.month = None;
            self.hour = None;
            self.prefixed_day_of_week = None;
            self.prefixed_month = None;
            return;
        };

        let day_of_week = moment.format("%A").to_string();
        let month = moment.format("%B").to_string();

        self.prefixed_day_of_week = Some(format!(
            "{} - {}",
            moment.weekday().number_from_monday(),
            day_of_week
        ));
        self.prefixed_month = Some(format!("{:02} - {}", moment.month(), month));
        self.hour = Some(format!("{:02}", moment.hour()));
        self.day_of_week = Some(day_of_week);
        self.month = Some(month);
    }

    /// Serialize the object into the JSON body sent to the search engine.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
