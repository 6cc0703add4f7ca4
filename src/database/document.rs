use chrono::{SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Schema-free field set stored in an entity row's `data` column.
pub type Document = Map<String, Value>;

/// Envelope keys that always win over same-named document fields.
const ENVELOPE_KEYS: &[&str] = &["id", "created_by", "created_at", "updated_at"];

/// Current time in the format used by every timestamp column.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Overlay the top-level keys of `overlay` onto `existing`.
pub fn shallow_merge(mut existing: Document, overlay: Document) -> Document {
    for (key, value) in overlay {
        existing.insert(key, value);
    }
    existing
}

/// Remove `id` from a payload, returning it as a string when usable.
pub fn take_id(document: &mut Document) -> Option<String> {
    match document.remove("id")? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One stored row: fixed envelope plus the document.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: String,
    pub data: Document,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl EntityRecord {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// Flattened as {id, ...data, created_by, created_at, updated_at}
impl Serialize for EntityRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self
            .data
            .iter()
            .filter(|(k, _)| !ENVELOPE_KEYS.contains(&k.as_str()));

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("created_by", &self.created_by)?;
        map.serialize_entry("created_at", &self.created_at)?;
        map.serialize_entry("updated_at", &self.updated_at)?;
        map.end()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntityRow {
    pub id: String,
    pub data: String,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<EntityRow> for EntityRecord {
    type Error = serde_json::Error;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            data: serde_json::from_str(&row.data)?,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn merge_preserves_overwrites_and_adds() {
        let merged = shallow_merge(doc(json!({"a": 1, "b": 2})), doc(json!({"b": 3, "c": 4})));
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn merge_is_shallow_and_keeps_explicit_null() {
        let merged = shallow_merge(
            doc(json!({"address": {"city": "Pune", "zip": "411001"}, "notes": "x"})),
            doc(json!({"address": {"city": "Leeds"}, "notes": null})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"address": {"city": "Leeds"}, "notes": null})
        );
    }

    #[test]
    fn take_id_strips_and_stringifies() {
        let mut d = doc(json!({"id": 42, "name": "x"}));
        assert_eq!(take_id(&mut d), Some("42".to_string()));
        assert!(!d.contains_key("id"));

        let mut d = doc(json!({"id": null}));
        assert_eq!(take_id(&mut d), None);
        assert!(d.is_empty());
    }

    #[test]
    fn record_flattens_with_envelope_winning() {
        let record = EntityRecord {
            id: "row-1".into(),
            data: doc(json!({"id": "spoofed", "a": 1, "b": "x", "created_at": "never"})),
            created_by: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let value = record.to_value();
        assert_eq!(
            value,
            json!({
                "id": "row-1",
                "a": 1,
                "b": "x",
                "created_by": null,
                "created_at": "2026-01-01T00:00:00.000Z",
                "updated_at": "2026-01-01T00:00:00.000Z"
            })
        );
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.first().map(|k| k.as_str()), Some("id"));
    }

    #[test]
    fn timestamps_sort_lexically() {
        let a = timestamp_now();
        assert!(a.ends_with('Z'));
        assert_eq!(a.len(), "2026-01-01T00:00:00.000Z".len());
    }
}
