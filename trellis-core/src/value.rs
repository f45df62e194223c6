//! Dynamic Value Model
//!
//! Reactive state in Trellis is dynamically shaped: a signal may hold a
//! number today and a nested object tomorrow, and template-facing code needs
//! one type that covers all of it. [`Value`] is that type, a tagged union
//! over scalars, raw containers, and the two reactive forms.
//!
//! # Raw vs reactive
//!
//! [`Value::Map`] and [`Value::List`] are *raw* containers: reading through
//! them records nothing. Passing a raw container through
//! [`Runtime::reactive`] produces [`Value::Reactive`], whose per-key reads
//! and writes participate in dependency tracking. Values stored inside a
//! reactive object stay raw; they are wrapped on the way out of a read, not
//! eagerly.
//!
//! # Equality
//!
//! Scalars compare structurally. Containers, reactive objects, and signals
//! compare by identity (shared allocation), which is the sense in which
//! wrapping the same raw object twice yields an equal result.
//!
//! # Snapshots
//!
//! `Value` serializes with serde by snapshotting current contents: signals
//! contribute their current value without subscribing anything, reactive
//! objects contribute their raw target. [`Value::from_json`] parses JSON
//! back into plain variants only; deserialization never fabricates signals
//! or wrappers.
//!
//! [`Runtime::reactive`]: crate::reactive::Runtime::reactive

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use thiserror::Error;

use crate::reactive::{Reactive, Signal};

/// Shared, insertion-ordered string-keyed container.
pub type RawMap = Arc<RwLock<IndexMap<String, Value>>>;

/// Shared growable array container.
pub type RawList = Arc<RwLock<Vec<Value>>>;

/// Error returned by the typed accessors when a value has the wrong shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("type mismatch: expected {expected}, found {found}")]
pub struct TypeError {
    /// The kind the caller asked for.
    pub expected: &'static str,
    /// The kind the value actually has.
    pub found: &'static str,
}

/// A dynamically shaped value.
///
/// # Example
///
/// ```rust,ignore
/// let state = Value::map([
///     ("count", Value::from(0)),
///     ("items", Value::list([Value::from("a"), Value::from("b")])),
/// ]);
/// ```
#[derive(Clone, Debug)]
pub enum Value {
    /// The absent value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// An owned string.
    Str(String),
    /// A raw (untracked) map.
    Map(RawMap),
    /// A raw (untracked) list.
    List(RawList),
    /// A dependency-tracked object wrapper.
    Reactive(Reactive),
    /// A reactive value cell.
    Signal(Signal),
}

impl Value {
    /// Build a raw map value from key/value entries.
    pub fn map<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map: IndexMap<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        Value::Map(Arc::new(RwLock::new(map)))
    }

    /// Build a raw list value from items.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Arc::new(RwLock::new(items.into_iter().collect())))
    }

    /// The kind of this value, as a static name.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Map(_) => "map",
            Value::List(_) => "list",
            Value::Reactive(_) => "reactive",
            Value::Signal(_) => "signal",
        }
    }

    /// Whether this value is a reactive value cell.
    pub fn is_signal(&self) -> bool {
        matches!(self, Value::Signal(_))
    }

    /// Unwrap one level of signal.
    ///
    /// For a signal, reads and returns its current value (subscribing the
    /// running effect, exactly like any other signal read). Anything else is
    /// returned as-is.
    pub fn unref(&self) -> Value {
        match self {
            Value::Signal(signal) => signal.get(),
            other => other.clone(),
        }
    }

    fn mismatch(&self, expected: &'static str) -> TypeError {
        TypeError {
            expected,
            found: self.kind(),
        }
    }

    /// Read this value as a boolean.
    pub fn as_bool(&self) -> Result<bool, TypeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    /// Read this value as an integer.
    pub fn as_int(&self) -> Result<i64, TypeError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(other.mismatch("int")),
        }
    }

    /// Read this value as a float. Integers are widened.
    pub fn as_float(&self) -> Result<f64, TypeError> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(other.mismatch("float")),
        }
    }

    /// Borrow this value as a string slice.
    pub fn as_str(&self) -> Result<&str, TypeError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    /// Share this value's raw map.
    pub fn as_map(&self) -> Result<RawMap, TypeError> {
        match self {
            Value::Map(map) => Ok(Arc::clone(map)),
            other => Err(other.mismatch("map")),
        }
    }

    /// Share this value's raw list.
    pub fn as_list(&self) -> Result<RawList, TypeError> {
        match self {
            Value::List(list) => Ok(Arc::clone(list)),
            other => Err(other.mismatch("list")),
        }
    }

    /// Share this value's reactive wrapper.
    pub fn as_reactive(&self) -> Result<Reactive, TypeError> {
        match self {
            Value::Reactive(reactive) => Ok(reactive.clone()),
            other => Err(other.mismatch("reactive")),
        }
    }

    /// Share this value's signal.
    pub fn as_signal(&self) -> Result<Signal, TypeError> {
        match self {
            Value::Signal(signal) => Ok(signal.clone()),
            other => Err(other.mismatch("signal")),
        }
    }

    /// Serialize a snapshot of this value to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a JSON string into plain (non-reactive) values.
    pub fn from_json(input: &str) -> serde_json::Result<Value> {
        let parsed: serde_json::Value = serde_json::from_str(input)?;
        Ok(Value::from_parsed(parsed))
    }

    fn from_parsed(parsed: serde_json::Value) -> Value {
        match parsed {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from_parsed))
            }
            serde_json::Value::Object(entries) => {
                Value::map(entries.into_iter().map(|(k, v)| (k, Value::from_parsed(v))))
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Reactive(a), Value::Reactive(b)) => a.ptr_eq(b),
            (Value::Signal(a), Value::Signal(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Signal> for Value {
    fn from(v: Signal) -> Self {
        Value::Signal(v)
    }
}

impl From<Reactive> for Value {
    fn from(v: Reactive) -> Self {
        Value::Reactive(v)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Map(map) => {
                let guard = map.read();
                let mut state = serializer.serialize_map(Some(guard.len()))?;
                for (key, value) in guard.iter() {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
            Value::List(list) => {
                let guard = list.read();
                let mut state = serializer.serialize_seq(Some(guard.len()))?;
                for value in guard.iter() {
                    state.serialize_element(value)?;
                }
                state.end()
            }
            Value::Reactive(reactive) => reactive.raw().serialize(serializer),
            Value::Signal(signal) => signal.get_untracked().serialize(serializer),
        }
    }
}
