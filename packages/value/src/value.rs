//! The Value type - the dynamic tree shared by scripts and the marshaler.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A JSON-like value with a native time leaf.
///
/// Maps use `BTreeMap`, so key order is deterministic and insertion order
/// carries no meaning. `Bytes` holds byte strings that are not valid UTF-8;
/// `Time` holds native time values produced by the `times` script module.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Time(_) => "time",
            Value::Array(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key on a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    /// Walk a sequence of map keys and array indices.
    ///
    /// Returns `None` if a component is missing or the walk reaches a
    /// scalar before the path is exhausted.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let mut current = self;
        for component in path {
            current = match current {
                Value::Map(map) => map.get(*component)?,
                Value::Array(items) => {
                    let index: usize = component.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Insert into a map value, returning the previous entry.
    ///
    /// Non-map values are left untouched and `None` is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.as_map_mut()?.insert(key.into(), value.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    #[test]
    fn get_path_walks_maps_and_arrays() {
        let value = Value::Map(btree! {
            "data".to_string() => Value::Map(btree! {
                "columns".to_string() => Value::from(vec!["id", "title"]),
            }),
        });

        assert_eq!(
            value.get_path(&["data", "columns", "1"]),
            Some(&Value::from("title"))
        );
        assert_eq!(value.get_path(&["data", "columns", "2"]), None);
        assert_eq!(value.get_path(&["data", "columns", "x"]), None);
        assert_eq!(value.get_path(&[]), Some(&value));
    }

    #[test]
    fn insert_only_touches_maps() {
        let mut map = Value::map();
        assert_eq!(map.insert("a", 1i64), None);
        assert_eq!(map.insert("a", 2i64), Some(Value::Integer(1)));
        assert_eq!(map.get("a"), Some(&Value::Integer(2)));

        let mut scalar = Value::from(true);
        assert_eq!(scalar.insert("a", 1i64), None);
        assert_eq!(scalar, Value::Bool(true));
    }

    #[test]
    fn type_names_follow_the_script_vocabulary() {
        assert_eq!(Value::array().type_name(), "list");
        assert_eq!(Value::map().type_name(), "map");
        assert_eq!(Value::from(None::<i64>).type_name(), "null");
    }
}
