//! Metadata payloads and the deep-key matcher.
//!
//! Every log entry carries a free-form nested metadata tree. A handful of
//! top-level fields are conventional (`log_level`, `visible_to`, `status`,
//! `category`, `log_chain`, `data`); everything else is caller payload.
//! `serde_json::Value` supplies the tagged scalar/array/object representation.

use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Conventional metadata field names
pub const FIELD_LOG_LEVEL: &str = "log_level";
pub const FIELD_VISIBLE_TO: &str = "visible_to";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_LOG_CHAIN: &str = "log_chain";
pub const FIELD_DATA: &str = "data";

/// Nested metadata attached to a log entry.
///
/// A thin wrapper over a JSON object map, adding accessors for the
/// conventional fields and recursive key search. Trees are built fresh per
/// entry and never shared, so there are no aliasing or cycle concerns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    /// Create an empty metadata tree
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing JSON object map
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build metadata from any JSON value.
    ///
    /// Objects are taken as-is; any other value is stored under `data`,
    /// so callers can pass bare payloads without wrapping them first.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::Null => Self::new(),
            other => {
                let mut map = Map::new();
                map.insert(FIELD_DATA.to_string(), other);
                Self(map)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert a top-level field, replacing any existing value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Shallow accessor for an arbitrary top-level field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Level recorded under `log_level`; absent or unrecognized means `Info`
    pub fn level(&self) -> LogLevel {
        self.get_str(FIELD_LOG_LEVEL)
            .map(LogLevel::from_stored)
            .unwrap_or_default()
    }

    /// Advisory audience tag under `visible_to`
    pub fn visible_to(&self) -> Option<&str> {
        self.get_str(FIELD_VISIBLE_TO)
    }

    /// Free-form status string under `status`
    pub fn status(&self) -> Option<&str> {
        self.get_str(FIELD_STATUS)
    }

    /// Free-form category string under `category`
    pub fn category(&self) -> Option<&str> {
        self.get_str(FIELD_CATEGORY)
    }

    /// Correlation chain id under `log_chain`
    pub fn chain(&self) -> Option<&str> {
        self.get_str(FIELD_LOG_CHAIN)
    }

    /// Caller payload under `data`
    pub fn data(&self) -> Option<&Value> {
        self.0.get(FIELD_DATA)
    }

    /// True if the entry carries a non-null, non-empty `data` payload
    pub fn has_data(&self) -> bool {
        match self.data() {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Inject the resolved correlation chain id
    pub fn set_chain(&mut self, chain: impl Into<String>) {
        self.0
            .insert(FIELD_LOG_CHAIN.to_string(), Value::String(chain.into()));
    }

    /// True if `key` occurs as an object key anywhere in the tree, at any
    /// depth, including inside array elements. Depth-first with early
    /// termination.
    pub fn has_key(&self, key: &str) -> bool {
        self.0
            .iter()
            .any(|(k, v)| k == key || value_has_key(v, key))
    }

    /// True if every key in `keys` occurs somewhere in the tree.
    ///
    /// Each key is matched independently; two keys need not share a parent
    /// object. Requiring co-occurrence within one subtree would be a
    /// different (stricter) predicate and is deliberately not what this does.
    pub fn has_all_keys<I, S>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter().all(|k| self.has_key(k.as_ref()))
    }

    /// View as a JSON value (cloning the underlying map)
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Recursive step of the deep-key matcher
fn value_has_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(k, v)| k == key || value_has_key(v, key)),
        Value::Array(items) => items.iter().any(|v| value_has_key(v, key)),
        _ => false,
    }
}
