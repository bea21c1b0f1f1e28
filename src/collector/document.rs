//! Management API documents
//!
//! The broker's JSON is read through total accessors: a missing or null
//! number reads as `0`, a missing sub-object reads as absent. Nothing here
//! fails on a missing key.

use serde_json::Value;

use crate::error::{ExtractError, SourceError};

/// Collector operation result type
pub type CollectResult<T> = Result<T, SourceError>;

/// One parsed response body of the management API
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDocument {
    resource: String,
    value: Value,
}

impl ResourceDocument {
    /// Parse a response body fetched for `resource`
    pub fn parse(resource: &str, body: &str) -> CollectResult<Self> {
        let value = serde_json::from_str(body).map_err(|e| SourceError::MalformedResponse {
            resource: resource.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::from_value(resource, value))
    }

    /// Wrap an already decoded value
    pub fn from_value(resource: &str, value: Value) -> Self {
        Self {
            resource: resource.to_string(),
            value,
        }
    }

    /// Resource path this document was fetched from
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Raw JSON value
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Top level as a mapping, e.g. `overview` or `nodes/<id>`
    pub fn object(&self) -> Result<Section<'_>, ExtractError> {
        if self.value.is_object() {
            Ok(Section(&self.value))
        } else {
            Err(ExtractError::UnexpectedShape {
                what: self.resource.clone(),
                expected: "object",
                found: kind_of(&self.value),
            })
        }
    }

    /// Top level as a list of mappings, e.g. `queues` or `exchanges`
    ///
    /// List items that are not mappings are dropped.
    pub fn items(&self) -> Result<impl Iterator<Item = Section<'_>>, ExtractError> {
        match &self.value {
            Value::Array(items) => Ok(items.iter().filter(|v| v.is_object()).map(Section)),
            other => Err(ExtractError::UnexpectedShape {
                what: self.resource.clone(),
                expected: "array",
                found: kind_of(other),
            }),
        }
    }
}

/// Borrowed view of one JSON mapping inside a document
#[derive(Debug, Clone, Copy)]
pub struct Section<'a>(&'a Value);

impl<'a> Section<'a> {
    /// Numeric field, `0` when absent, null or not numeric
    ///
    /// Numeric strings are accepted. The result is always finite.
    pub fn number(&self, key: &str) -> f64 {
        self.0.get(key).map(coerce_number).unwrap_or(0.0)
    }

    /// Nested mapping, `None` when absent or not a mapping
    pub fn child(&self, key: &str) -> Option<Section<'a>> {
        self.0.get(key).filter(|v| v.is_object()).map(Section)
    }

    /// String field, `None` when absent or not a string
    pub fn string(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Boolean field, `false` when absent or not a boolean
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// JSON type of `key`, `None` when absent
    pub fn kind_of(&self, key: &str) -> Option<&'static str> {
        self.0.get(key).map(kind_of)
    }
}

/// Coerce a JSON value to a finite number, defaulting to `0`
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };

    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_document() {
        let doc = ResourceDocument::parse("overview", r#"{"node": "rabbit@n1"}"#).unwrap();
        assert_eq!(doc.resource(), "overview");
        assert_eq!(doc.object().unwrap().string("node"), Some("rabbit@n1"));
    }

    #[test]
    fn test_parse_malformed_body() {
        let err = ResourceDocument::parse("queues", "<html>oops</html>").unwrap_err();
        assert!(matches!(
            err,
            SourceError::MalformedResponse { ref resource, .. } if resource == "queues"
        ));
    }

    #[test]
    fn test_number_defaults() {
        let doc = ResourceDocument::from_value(
            "nodes/rabbit@n1",
            json!({"fd_used": 12, "mem_used": null, "uptime": 1.5, "run_queue": "3"}),
        );
        let section = doc.object().unwrap();

        assert_eq!(section.number("fd_used"), 12.0);
        assert_eq!(section.number("uptime"), 1.5);
        assert_eq!(section.number("run_queue"), 3.0);
        assert_eq!(section.number("mem_used"), 0.0);
        assert_eq!(section.number("disk_free"), 0.0);
    }

    #[test]
    fn test_coerce_number_is_finite() {
        assert_eq!(coerce_number(&json!("NaN")), 0.0);
        assert_eq!(coerce_number(&json!("inf")), 0.0);
        assert_eq!(coerce_number(&json!("not a number")), 0.0);
        assert_eq!(coerce_number(&json!([1, 2])), 0.0);
        assert_eq!(coerce_number(&json!(true)), 1.0);
    }

    #[test]
    fn test_child_sections() {
        let doc = ResourceDocument::from_value(
            "overview",
            json!({"message_stats": {"publish_details": {"rate": 0.5}}, "queue_totals": 7}),
        );
        let section = doc.object().unwrap();

        let stats = section.child("message_stats").unwrap();
        assert_eq!(stats.child("publish_details").unwrap().number("rate"), 0.5);
        assert!(stats.child("ack_details").is_none());
        assert!(section.child("queue_totals").is_none());
        assert_eq!(section.kind_of("queue_totals"), Some("number"));
        assert_eq!(section.kind_of("object_totals"), None);
    }

    #[test]
    fn test_shape_mismatch() {
        let doc = ResourceDocument::from_value("queues", json!({"error": "not_authorised"}));
        let err = doc.items().err().unwrap();
        assert_eq!(
            err,
            ExtractError::UnexpectedShape {
                what: "queues".to_string(),
                expected: "array",
                found: "object",
            }
        );

        let doc = ResourceDocument::from_value("overview", json!([]));
        assert!(doc.object().is_err());
    }

    #[test]
    fn test_items_skip_non_objects() {
        let doc = ResourceDocument::from_value("queues", json!([{"name": "a"}, 1, null, {"name": "b"}]));
        let names: Vec<_> = doc.items().unwrap().filter_map(|q| q.string("name")).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
