use serde_json::{Map, Value};

/// Equality predicates over top-level document fields.
///
/// An item matches when every listed field is present and equal to the
/// given value. An empty filter matches every item of the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanFilter {
    fields: Map<String, Value>,
}

impl ScanFilter {
    /// Creates a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality predicate.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns true if the document satisfies every predicate.
    pub fn matches(&self, document: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }

    /// Returns the predicates as a JSON object (used for JSONB containment).
    pub fn as_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Returns true if the filter has no predicates.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ScanFilter::new().matches(&json!({"a": 1})));
    }

    #[test]
    fn all_predicates_must_match() {
        let filter = ScanFilter::new()
            .where_eq("status", "NOT_PUBLISHED")
            .where_eq("correlationId", "c-1");

        assert!(filter.matches(&json!({"status": "NOT_PUBLISHED", "correlationId": "c-1"})));
        assert!(!filter.matches(&json!({"status": "NOT_PUBLISHED", "correlationId": "c-2"})));
        assert!(!filter.matches(&json!({"status": "NOT_PUBLISHED"})));
    }

    #[test]
    fn as_json_builds_containment_object() {
        let filter = ScanFilter::new().where_eq("status", "FAILED");
        assert_eq!(filter.as_json(), json!({"status": "FAILED"}));
    }
}
