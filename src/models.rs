//! Todo Models
//!
//! Data structures matching the persistence service's todo documents.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Opaque document identifier (`_id` on the wire)
///
/// Services keyed by integers send a numeric `_id`; it is read into its
/// decimal text and serialized back as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TodoId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for TodoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Number(id) => Self(id.to_string()),
        })
    }
}

impl TodoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Todo data structure (matches backend)
///
/// Only `is_completed` is ever changed on the client. Every other field the
/// service sends (title, timestamps, ...) is kept in `extra` and written
/// back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(rename = "_id")]
    pub id: TodoId,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TodoItem {
    pub fn new(id: impl Into<TodoId>, is_completed: bool) -> Self {
        Self {
            id: id.into(),
            is_completed,
            extra: Map::new(),
        }
    }

    /// Attach an opaque payload field
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Copy of this item with the completion flag set to `is_completed`
    pub fn with_completion(&self, is_completed: bool) -> Self {
        Self {
            is_completed,
            ..self.clone()
        }
    }

    /// `title` payload field, if the service sent one
    pub fn title(&self) -> Option<&str> {
        self.extra.get("title").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_keeps_payload() {
        let raw = json!({
            "_id": "65f1",
            "title": "Buy milk",
            "isCompleted": false,
            "createdAt": "2024-03-13T10:00:00.000Z",
            "__v": 0
        });

        let item: TodoItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(item.id, TodoId::new("65f1"));
        assert!(!item.is_completed);
        assert_eq!(item.title(), Some("Buy milk"));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_numeric_id_is_read_as_text() {
        let item: TodoItem = serde_json::from_value(json!({ "_id": 17, "isCompleted": true })).unwrap();
        assert_eq!(item.id, TodoId::new("17"));
        assert_eq!(serde_json::to_value(&item).unwrap()["_id"], json!("17"));
    }

    #[test]
    fn test_non_scalar_id_is_rejected() {
        assert!(serde_json::from_value::<TodoItem>(json!({ "_id": true })).is_err());
        assert!(serde_json::from_value::<TodoItem>(json!({ "_id": { "$oid": "x" } })).is_err());
    }

    #[test]
    fn test_missing_flag_defaults_to_incomplete() {
        let item: TodoItem = serde_json::from_value(json!({ "_id": "a" })).unwrap();
        assert!(!item.is_completed);
    }

    #[test]
    fn test_with_completion_only_changes_flag() {
        let item = TodoItem::new("a", false).with_field("title", "Walk dog");
        let flipped = item.with_completion(true);

        assert!(flipped.is_completed);
        assert_eq!(flipped.id, item.id);
        assert_eq!(flipped.extra, item.extra);
    }
}
