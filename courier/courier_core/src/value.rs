//! Message payload values.
//!
//! Every message routed between actors is a sequence of [`Value`]s. A value
//! is a small tagged tree that can represent scalars, sequences and maps, and
//! that serializes to and from JSON without loss of shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A message is an ordered sequence of values.
pub type Message = Vec<Value>;

/// A payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer value.
    Integer(i64),

    /// Floating-point value.
    Float(f64),

    /// String value.
    String(String),

    /// Sequence of values.
    Array(Vec<Value>),

    /// Map of values, ordered by key.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Name of this value's variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is a sequence.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Check if this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer.
    ///
    /// Floats with no fractional part that fit in an `i64` are converted.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Get this value as a floating-point number.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a slice of values.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get a mutable reference to this value as a sequence.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get a mutable reference to this value as a map.
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert this value into a message.
    ///
    /// # Returns
    ///
    /// The elements of the sequence, or the original value back if it is not
    /// a sequence.
    pub fn into_message(self) -> Result<Message, Value> {
        match self {
            Self::Array(a) => Ok(a),
            other => Err(other),
        }
    }

    /// Get an element of a sequence by index.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Array(a) => a.get(index),
            _ => None,
        }
    }

    /// Get an entry of a map by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Mutable variant of [`Value::get_index`].
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            Self::Array(a) => a.get_mut(index),
            _ => None,
        }
    }

    /// Mutable variant of [`Value::get`].
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Self::Map(m) => m.get_mut(key),
            _ => None,
        }
    }

    /// Insert an entry into a map.
    ///
    /// # Returns
    ///
    /// `true` if the entry was inserted, `false` if this value is not a map.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self {
            Self::Map(m) => {
                m.insert(key.into(), value.into());
                true
            }
            _ => false,
        }
    }

    /// Append an element to a sequence.
    ///
    /// # Returns
    ///
    /// `true` if the element was appended, `false` if this value is not a sequence.
    pub fn push(&mut self, value: impl Into<Value>) -> bool {
        match self {
            Self::Array(a) => {
                a.push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Remove an entry from a map.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match self {
            Self::Map(m) => m.remove(key),
            _ => None,
        }
    }

    /// Remove an element from a sequence.
    pub fn remove_index(&mut self, index: usize) -> Option<Value> {
        match self {
            Self::Array(a) if index < a.len() => Some(a.remove(index)),
            _ => None,
        }
    }

    /// Number of elements of a sequence or entries of a map.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Array(a) => Some(a.len()),
            Self::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    /// Whether a sequence or map has no elements.
    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }

    /// Merge another value into this one.
    ///
    /// Maps are merged recursively, key by key. Sequences are concatenated.
    /// Any other combination replaces this value with `other`.
    pub fn merge(&mut self, other: Value) {
        match (self, other) {
            (Self::Map(a), Self::Map(b)) => {
                for (key, value) in b {
                    match a.get_mut(&key) {
                        Some(existing) if existing.is_map() && value.is_map() => {
                            existing.merge(value)
                        }
                        _ => {
                            a.insert(key, value);
                        }
                    }
                }
            }
            (Self::Array(a), Self::Array(b)) => {
                a.extend(b);
            }
            (a, b) => {
                *a = b;
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(m: BTreeMap<String, T>) -> Self {
        Self::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Self::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Build a [`Message`] from a list of expressions convertible into [`Value`].
///
/// ```
/// use courier_core::{message, Value};
///
/// let msg = message!["ping", 3, true];
/// assert_eq!(msg, vec![Value::from("ping"), Value::Integer(3), Value::Bool(true)]);
/// ```
#[macro_export]
macro_rules! message {
    () => {
        $crate::value::Message::new()
    };
    ($($item:expr),+ $(,)?) => {
        vec![$($crate::value::Value::from($item)),+]
    };
}
