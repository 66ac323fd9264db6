//! Entity references as they appear on the wire
//!
//! The API returns a reference to another entity in three shapes: a bare id
//! string, a populated object carrying `_id`, or a numeric id. All of them are
//! resolved once through [`resolve_id`] so joins only ever compare strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Resolve a reference value to its id string.
///
/// - non-empty string → itself (trimmed)
/// - integer → its decimal text
/// - object → its `_id`, `id` or `$oid` field, resolved recursively
/// - anything else → `None`
pub fn resolve_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Object(map) => ["_id", "id", "$oid"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(resolve_id),
        _ => None,
    }
}

/// Normalized reference to another entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntityRef(Option<String>);

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        resolve_id(&Value::String(id)).map_or(Self(None), |id| Self(Some(id)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// True when this reference points at `id`
    pub fn points_to(&self, id: &str) -> bool {
        self.0.as_deref() == Some(id)
    }
}

impl From<&Value> for EntityRef {
    fn from(value: &Value) -> Self {
        Self(resolve_id(value))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or(""))
    }
}

impl<'de> Deserialize<'de> for EntityRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from(&value))
    }
}

impl Serialize for EntityRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.0 {
            Some(id) => serializer.serialize_str(id),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_all_shapes_equal() {
        let raw = resolve_id(&json!("A1"));
        let populated = resolve_id(&json!({ "_id": "A1", "name": "Acme" }));
        let padded = resolve_id(&json!("  A1 "));

        assert_eq!(raw.as_deref(), Some("A1"));
        assert_eq!(raw, populated);
        assert_eq!(raw, padded);
    }

    #[test]
    fn test_resolve_nested_and_numeric() {
        assert_eq!(
            resolve_id(&json!({ "_id": { "$oid": "65f0" } })).as_deref(),
            Some("65f0")
        );
        assert_eq!(resolve_id(&json!({ "id": 42 })).as_deref(), Some("42"));
        assert_eq!(resolve_id(&json!(7)).as_deref(), Some("7"));
    }

    #[test]
    fn test_resolve_unusable_values() {
        assert_eq!(resolve_id(&json!(null)), None);
        assert_eq!(resolve_id(&json!("")), None);
        assert_eq!(resolve_id(&json!(true)), None);
        assert_eq!(resolve_id(&json!(["A1"])), None);
        assert_eq!(resolve_id(&json!({ "name": "no id" })), None);
        assert_eq!(resolve_id(&json!(1.5)), None);
    }

    #[test]
    fn test_entity_ref_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            agency: EntityRef,
        }

        let a: Holder = serde_json::from_value(json!({ "agency": "A1" })).unwrap();
        let b: Holder = serde_json::from_value(json!({ "agency": { "_id": "A1" } })).unwrap();
        let c: Holder = serde_json::from_value(json!({ "agency": null })).unwrap();

        assert!(a.agency.points_to("A1"));
        assert_eq!(a.agency, b.agency);
        assert!(!c.agency.is_set());
    }
}
