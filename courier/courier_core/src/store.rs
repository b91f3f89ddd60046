//! Path-addressable structured data.
//!
//! A [`Store`] holds a tree of [`Value`]s addressed by dotted paths with
//! optional sequence indices, e.g. `network.interfaces[0].name`. Supervisors
//! use stores to hand named structured data to actors before they start;
//! actors read them from their context once running.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::StoreError;
use crate::value::Value;

/// A tree of values addressed by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    root: Value,
}

impl Store {
    /// Create an empty store with a map at its root.
    pub fn new() -> Self {
        Self {
            root: Value::Map(BTreeMap::new()),
        }
    }

    /// Create a store from a root value.
    pub fn from_value(root: impl Into<Value>) -> Self {
        Self { root: root.into() }
    }

    /// Parse a store from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        Ok(Self {
            root: serde_json::from_str(json)?,
        })
    }

    /// Render this store as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// The root value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Get a value by path. An empty path addresses the root.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;

        for part in parse_path(path) {
            current = match part {
                PathPart::Key(key) => current.get(key)?,
                PathPart::Index(index) => current.get_index(index)?,
            };
        }

        Some(current)
    }

    /// Get a value by path as a specific type.
    ///
    /// # Errors
    ///
    /// `UndefinedPath` if nothing exists at `path`, `TypeMismatch` if the value
    /// there cannot be converted to `T`.
    ///
    /// ```
    /// use courier_core::store::Store;
    ///
    /// let mut store = Store::new();
    /// store.set("limits.depth", 3).unwrap();
    /// assert_eq!(store.get_as::<i64>("limits.depth").unwrap(), 3);
    /// assert!(store.get_as::<String>("limits.depth").is_err());
    /// ```
    pub fn get_as<T: FromValue>(&self, path: &str) -> Result<T, StoreError> {
        let value = self
            .get(path)
            .ok_or_else(|| StoreError::UndefinedPath(path.to_string()))?;

        T::from_value(value).ok_or_else(|| StoreError::TypeMismatch {
            path: path.to_string(),
            expected: T::TYPE_NAME.to_string(),
        })
    }

    /// Get a mutable reference to a value by path.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        let mut current = &mut self.root;

        for part in parse_path(path) {
            current = match part {
                PathPart::Key(key) => current.get_mut(key)?,
                PathPart::Index(index) => current.get_index_mut(index)?,
            };
        }

        Some(current)
    }

    /// Set a value by path, creating intermediate maps and sequences as needed.
    ///
    /// A scalar found where a container is needed is replaced by the container.
    /// A sequence index may address an existing element or the one just past
    /// the end, which appends.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if an index lies beyond the end of its sequence.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        let parts = parse_path(path);

        let Some((last, intermediate)) = parts.split_last() else {
            self.root = value.into();
            return Ok(());
        };

        let mut current = &mut self.root;

        for (i, part) in intermediate.iter().enumerate() {
            let next = &parts[i + 1];
            current = descend_or_create(current, part, next).map_err(|reason| {
                StoreError::InvalidPath(path.to_string(), reason)
            })?;
        }

        match last {
            PathPart::Key(key) => {
                if !current.is_map() {
                    *current = Value::Map(BTreeMap::new());
                }
                current.set(*key, value);
            }
            PathPart::Index(index) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                if let Some(array) = current.as_array_mut() {
                    let slot = sequence_slot(array, *index, || Value::Null)
                        .map_err(|reason| StoreError::InvalidPath(path.to_string(), reason))?;
                    *slot = value.into();
                }
            }
        }

        Ok(())
    }

    /// Remove a value by path. Removing the empty path resets the root to null.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let parts = parse_path(path);

        let Some((last, intermediate)) = parts.split_last() else {
            return Some(std::mem::take(&mut self.root));
        };

        let mut current = &mut self.root;
        for part in intermediate {
            current = match part {
                PathPart::Key(key) => current.get_mut(key)?,
                PathPart::Index(index) => current.get_index_mut(*index)?,
            };
        }

        match last {
            PathPart::Key(key) => current.remove(key),
            PathPart::Index(index) => current.remove_index(*index),
        }
    }

    /// Check if a path exists.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Merge another store into this one (see [`Value::merge`]).
    pub fn merge(&mut self, other: Store) {
        self.root.merge(other.root);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

fn descend_or_create<'a>(
    current: &'a mut Value,
    part: &PathPart<'_>,
    next: &PathPart<'_>,
) -> Result<&'a mut Value, String> {
    let empty_for_next = || match next {
        PathPart::Key(_) => Value::Map(BTreeMap::new()),
        PathPart::Index(_) => Value::Array(Vec::new()),
    };

    match part {
        PathPart::Key(key) => {
            if !current.is_map() {
                *current = Value::Map(BTreeMap::new());
            }
            let map = current
                .as_map_mut()
                .ok_or_else(|| format!("cannot descend at {}", key))?;
            Ok(map.entry(key.to_string()).or_insert_with(empty_for_next))
        }
        PathPart::Index(index) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let array = current
                .as_array_mut()
                .ok_or_else(|| format!("cannot descend at [{}]", index))?;
            sequence_slot(array, *index, empty_for_next)
        }
    }
}

// An index equal to the length appends a fresh element.
fn sequence_slot(
    array: &mut Vec<Value>,
    index: usize,
    fresh: impl FnOnce() -> Value,
) -> Result<&mut Value, String> {
    let len = array.len();
    if index > len {
        return Err(format!("index {} is beyond the end of a sequence of length {}", index, len));
    }
    if index == len {
        array.push(fresh());
    }
    Ok(&mut array[index])
}

// Helper enum for path parsing
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPart<'a> {
    Key(&'a str),
    Index(usize),
}

fn parse_path(path: &str) -> Vec<PathPart<'_>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_bracket = false;

    for (i, c) in path.char_indices() {
        match c {
            '.' if !in_bracket => {
                if i > start {
                    parts.push(PathPart::Key(&path[start..i]));
                }
                start = i + 1;
            }
            '[' => {
                if i > start {
                    parts.push(PathPart::Key(&path[start..i]));
                }
                start = i + 1;
                in_bracket = true;
            }
            ']' if in_bracket => {
                if let Ok(index) = path[start..i].parse::<usize>() {
                    parts.push(PathPart::Index(index));
                }
                start = i + 1;
                if path[start..].starts_with('.') {
                    start += 1;
                }
                in_bracket = false;
            }
            _ => {}
        }
    }

    if start < path.len() && !in_bracket {
        parts.push(PathPart::Key(&path[start..]));
    }

    parts
}

/// Conversion from a stored [`Value`] into a concrete type.
pub trait FromValue: Sized {
    /// Type name used in mismatch errors.
    const TYPE_NAME: &'static str;

    /// Convert, or `None` if the value has another shape.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_integer()
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(String::from)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const TYPE_NAME: &'static str = "array";

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_array()
            .map(|a| a.iter().filter_map(T::from_value).collect())
    }
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_paths() {
        let mut store = Store::new();

        store.set("a.b.c", 42).unwrap();
        store.set("a.d", "hello").unwrap();
        store.set("a.e[0]", 1).unwrap();
        store.set("a.e[1]", 2).unwrap();
        store.set("a.e[0]", 0).unwrap();

        assert_eq!(store.get("a.b.c"), Some(&Value::Integer(42)));
        assert_eq!(store.get("a.e[0]"), Some(&Value::Integer(0)));
        assert_eq!(store.get("a.e[1]"), Some(&Value::Integer(2)));
        assert!(store.get("a.x").is_none());
        assert!(store.get("a.e[10]").is_none());

        assert_eq!(store.get_as::<String>("a.d").unwrap(), "hello");
        assert!(matches!(
            store.get_as::<bool>("a.b.c"),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.get_as::<bool>("a.missing"),
            Err(StoreError::UndefinedPath(_))
        ));

        assert_eq!(store.remove("a.b.c"), Some(Value::Integer(42)));
        assert!(!store.contains("a.b.c"));
        assert!(store.contains("a.b"));
    }

    #[test]
    fn test_nested_sequence_paths() {
        let mut store = Store::new();
        store.set("ports[0].name", "eth0").unwrap();
        store.set("ports[1].name", "eth1").unwrap();
        store.set("matrix[0][0]", 4).unwrap();
        store.set("matrix[0][1]", 5).unwrap();

        assert_eq!(store.get_as::<String>("ports[1].name").unwrap(), "eth1");
        assert!(store.get("ports[0]").unwrap().is_map());
        assert_eq!(store.get_as::<i64>("matrix[0][1]").unwrap(), 5);
    }

    #[test]
    fn test_index_beyond_end_is_rejected() {
        let mut store = Store::new();
        store.set("a[0]", 1).unwrap();

        for path in ["a[2]", "a[18446744073709551615]", "b[1000000000000].c", "a[5][0]"] {
            assert!(
                matches!(store.set(path, 1), Err(StoreError::InvalidPath(ref p, _)) if p == path),
                "{} should be rejected",
                path
            );
        }

        assert_eq!(store.get("a").and_then(Value::len), Some(1));
        assert!(!store.contains("b[0]"));
    }

    #[test]
    fn test_empty_path_addresses_root() {
        let mut store = Store::new();
        store.set("", vec![1, 2]).unwrap();
        assert_eq!(store.get("").and_then(Value::len), Some(2));
        assert_eq!(store.remove(""), Some(Value::from(vec![1, 2])));
        assert!(store.root().is_null());
    }

    #[test]
    fn test_store_merge() {
        let mut base = Store::from_json_str(r#"{"net": {"port": 80, "host": "a"}}"#).unwrap();
        let patch = Store::from_json_str(r#"{"net": {"port": 8080}, "debug": true}"#).unwrap();

        base.merge(patch);

        assert_eq!(base.get_as::<i64>("net.port").unwrap(), 8080);
        assert_eq!(base.get_as::<String>("net.host").unwrap(), "a");
        assert!(base.get_as::<bool>("debug").unwrap());
    }

    #[test]
    fn test_store_json_round_trip() {
        let mut store = Store::new();
        store.set("limits.depth", 3).unwrap();
        let json = store.to_json_string().unwrap();
        assert_eq!(Store::from_json_str(&json).unwrap(), store);
        assert!(Store::from_json_str("{").is_err());
    }
}
