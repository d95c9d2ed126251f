use std::fmt;

use quorum_model::Table;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored record: a JSON object.
pub type Item = Map<String, Value>;

const KEY_SEPARATOR: char = '\u{1f}';

/// Serialize a record into a storable item.
pub fn to_item<T: Serialize>(record: &T) -> Result<Item, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "record must serialize to an object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Deserialize a stored item into a record.
pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(item))?)
}

/// Location of an attribute inside an item, one segment per nesting level.
///
/// `AttrPath::parse("progress.current")` points at `item["progress"]["current"]`.
/// Use [`AttrPath::from_segments`] when a segment may itself contain a dot
/// (class names are user-provided).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrPath(Vec<String>);

impl AttrPath {
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Resolve the path against an item.
    pub fn get<'a>(&self, item: &'a Item) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let mut value = item.get(first)?;
        for segment in rest {
            value = value.as_object()?.get(segment)?;
        }
        Some(value)
    }

    /// Write a value at the path, creating intermediate objects as needed.
    pub fn set(&self, item: &mut Item, value: Value) -> Result<(), StoreError> {
        let Some((last, parents)) = self.0.split_last() else {
            return Err(StoreError::InvalidUpdate("empty attribute path".into()));
        };

        let mut map = item;
        for segment in parents {
            let slot = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            map = slot.as_object_mut().ok_or_else(|| {
                StoreError::InvalidUpdate(format!("'{segment}' in '{self}' is not an object"))
            })?;
        }
        map.insert(last.clone(), value);
        Ok(())
    }
}

impl From<&str> for AttrPath {
    fn from(path: &str) -> Self {
        AttrPath::parse(path)
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Copy only the given attributes of an item.
pub(crate) fn project(item: &Item, paths: &[AttrPath]) -> Item {
    let mut out = Item::new();
    for path in paths {
        if let Some(value) = path.get(item) {
            // Paths resolved from an object always have object parents.
            let _ = path.set(&mut out, value.clone());
        }
    }
    out
}

/// Primary key of an item: the values of the table's key attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Key(Vec<(String, Value)>);

impl Key {
    pub fn new(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(vec![(attribute.into(), value.into())])
    }

    /// Add the next key attribute (for composite keys).
    pub fn and(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((attribute.into(), value.into()));
        self
    }

    /// Extract the key of `item` according to the table's key schema.
    pub fn of(table: &Table, item: &Item) -> Result<Self, StoreError> {
        let parts = table
            .key_attributes()
            .iter()
            .map(|attr| {
                item.get(*attr)
                    .cloned()
                    .map(|value| (attr.to_string(), value))
                    .ok_or_else(|| {
                        StoreError::InvalidKey(format!("item for '{table}' has no '{attr}'"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(parts))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode the key as an ordered string, checking it against the table schema.
    pub fn encode_for(&self, table: &Table) -> Result<String, StoreError> {
        let schema = table.key_attributes();
        let names: Vec<&str> = self.0.iter().map(|(k, _)| k.as_str()).collect();
        if names != schema {
            return Err(StoreError::InvalidKey(format!(
                "'{table}' is keyed by {schema:?}, got {names:?}"
            )));
        }

        let mut encoded = String::new();
        for (i, (attr, value)) in self.0.iter().enumerate() {
            if i > 0 {
                encoded.push(KEY_SEPARATOR);
            }
            match value {
                Value::String(s) if s.contains(KEY_SEPARATOR) => {
                    return Err(StoreError::InvalidKey(format!(
                        "key attribute '{attr}' contains a reserved separator"
                    )));
                }
                Value::String(s) => encoded.push_str(s),
                Value::Number(n) => encoded.push_str(&n.to_string()),
                other => {
                    return Err(StoreError::InvalidKey(format!(
                        "key attribute '{attr}' must be a string or number, got {}",
                        kind_of(other)
                    )));
                }
            }
        }
        Ok(encoded)
    }

    /// Seed an item with the key attributes (used when an update creates an item).
    pub(crate) fn to_item(&self) -> Item {
        self.0.iter().cloned().collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
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

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn nested_paths_resolve_and_write() {
        let mut it = item(json!({"progress": {"current": 1, "total": 3}}));
        let path = AttrPath::parse("progress.current");
        assert_eq!(path.get(&it), Some(&json!(1)));

        path.set(&mut it, json!(2)).unwrap();
        assert_eq!(it["progress"]["current"], json!(2));

        AttrPath::parse("a.b").set(&mut it, json!(true)).unwrap();
        assert_eq!(it["a"]["b"], json!(true));
    }

    #[test]
    fn class_segments_may_contain_dots() {
        let mut it = item(json!({"class": {"U.S.": 1}}));
        let path = AttrPath::from_segments(["class", "U.S."]);
        assert_eq!(path.get(&it), Some(&json!(1)));
        path.set(&mut it, json!(2)).unwrap();
        assert_eq!(it["class"]["U.S."], json!(2));
    }

    #[test]
    fn writing_through_a_scalar_fails() {
        let mut it = item(json!({"progress": 3}));
        let err = AttrPath::parse("progress.current")
            .set(&mut it, json!(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate(_)));
    }

    #[test]
    fn projection_keeps_only_requested_attributes() {
        let it = item(json!({"taskId": "t", "type": "text", "progress": {"current": 0, "total": 2}}));
        let out = project(&it, &[AttrPath::parse("taskId"), AttrPath::parse("progress.total")]);
        assert_eq!(Value::Object(out), json!({"taskId": "t", "progress": {"total": 2}}));
    }

    #[test]
    fn key_follows_table_schema() {
        let it = item(json!({"labelerId": "l", "taskId": "t", "jobId": "j"}));
        let key = Key::of(&Table::LabelerTask, &it).unwrap();
        assert_eq!(key, Key::new("labelerId", "l").and("taskId", "t"));
        assert_eq!(key.encode_for(&Table::LabelerTask).unwrap(), "l\u{1f}t");

        let wrong = Key::new("taskId", "t");
        assert!(matches!(
            wrong.encode_for(&Table::LabelerTask),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn key_requires_scalar_values() {
        let key = Key::new("taskId", json!({"nested": true}));
        assert!(key.encode_for(&Table::UnfinishedTask).is_err());
        assert!(Key::of(&Table::Job, &item(json!({"taskId": "t"}))).is_err());
    }
}
