//! List response normalization
//!
//! The backend wraps collections in several ways depending on the endpoint:
//! a bare array, a Spring page (`{content: [...]}`), `{events: [...]}` or
//! `{eventsClubs: [...]}`. Anything else is rejected.

use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// The list shapes observed on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    /// `[...]`
    Bare(Vec<T>),
    /// `{"content": [...], ...}`
    Paged {
        /// Page content
        content: Vec<T>,
    },
    /// `{"events": [...]}`
    Events {
        /// Events
        events: Vec<T>,
    },
    /// `{"eventsClubs": [...]}`
    ClubEvents {
        /// Club events
        #[serde(rename = "eventsClubs")]
        events_clubs: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    /// Name of the matched shape
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bare(_) => "array",
            Self::Paged { .. } => "content",
            Self::Events { .. } => "events",
            Self::ClubEvents { .. } => "eventsClubs",
        }
    }

    /// Unwrap the items
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items)
            | Self::Paged { content: items }
            | Self::Events { events: items }
            | Self::ClubEvents {
                events_clubs: items,
            } => items,
        }
    }
}

/// Extract the item list from a parsed response body
///
/// The shape is classified first so that a malformed item surfaces as a
/// JSON error rather than as an unknown shape.
pub fn normalize<T: DeserializeOwned>(body: Value) -> ApiResult<Vec<T>> {
    let envelope: ListEnvelope<Value> = serde_json::from_value(body.clone())
        .map_err(|_| ApiError::UnexpectedShape(describe(&body)))?;

    envelope
        .into_items()
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ApiError::from))
        .collect()
}

/// Parse and normalize a raw response body
pub fn normalize_str<T: DeserializeOwned>(body: &str) -> ApiResult<Vec<T>> {
    let value: Value = serde_json::from_str(body)?;
    normalize(value)
}

fn describe(body: &Value) -> String {
    match body {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
    }

    #[test]
    fn test_accepts_known_shapes() {
        let shapes = [
            json!([{"id": 1}, {"id": 2}]),
            json!({"content": [{"id": 1}, {"id": 2}], "totalPages": 1}),
            json!({"events": [{"id": 1}, {"id": 2}]}),
            json!({"eventsClubs": [{"id": 1}, {"id": 2}]}),
        ];

        for shape in shapes {
            let items: Vec<Item> = normalize(shape).unwrap();
            assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
        }
    }

    #[test]
    fn test_kind_names() {
        let envelope: ListEnvelope<Value> =
            serde_json::from_value(json!({"eventsClubs": []})).unwrap();
        assert_eq!(envelope.kind(), "eventsClubs");
    }

    #[test]
    fn test_rejects_unknown_shapes() {
        for body in [
            json!({"data": []}),
            json!({"message": "ok"}),
            json!(null),
            json!("events"),
            json!({"events": "none"}),
        ] {
            let result: ApiResult<Vec<Item>> = normalize(body);
            assert!(matches!(result, Err(ApiError::UnexpectedShape(_))));
        }
    }

    #[test]
    fn test_bad_item_is_json_error() {
        let result: ApiResult<Vec<Item>> = normalize(json!([{"id": "one"}]));
        assert!(matches!(result, Err(ApiError::Json(_))));
    }

    #[test]
    fn test_normalize_str() {
        let items: Vec<Item> = normalize_str(r#"{"content":[{"id":9}]}"#).unwrap();
        assert_eq!(items, vec![Item { id: 9 }]);
        assert!(normalize_str::<Item>("<html>").is_err());
    }
}
