//! The unified value model
//!
//! This module defines:
//! - `Value`: the single enum every engine operation works over
//! - `OpaqueHandle`: reference-identity wrapper for domain objects the
//!   engine never traverses
//! - `Record`: the insertion-ordered map type backing record containers
//!
//! Containers (`Array`, `Map`) are `Arc`-backed so that snapshots can share
//! unchanged subtrees by reference and callers can test sharing with
//! [`Value::same`]. A `Value` clone is therefore cheap: scalars copy, the
//! rest bump a reference count.
//!
//! ## Identity versus equality
//!
//! `PartialEq` is structural: two independently built maps with the same
//! entries compare equal. [`Value::same`] is the identity predicate the
//! engine's change detection uses: containers and opaque leaves are
//! identical only when they are the same allocation; scalars are identical
//! when equal (floats by bit pattern, so NaN is self-identical).

use crate::facade::Facade;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Insertion-ordered map backing record containers
///
/// Own-key enumeration of a record preserves insertion order and updates do
/// not reorder, so the engine's key enumeration is deterministic.
pub type Record = IndexMap<String, Value>;

/// Reference-identity handle around an arbitrary domain object
///
/// Opaque values are stored by reference and never traversed, wrapped, or
/// cloned by the engine. Two handles are equal only when they point at the
/// same allocation.
#[derive(Clone)]
pub struct OpaqueHandle(Arc<dyn Any + Send + Sync>);

impl OpaqueHandle {
    /// Wrap a domain object
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        OpaqueHandle(Arc::new(value))
    }

    /// Borrow the wrapped object if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Check whether two handles point at the same allocation
    pub fn same(&self, other: &OpaqueHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueHandle({:p})", Arc::as_ptr(&self.0))
    }
}

impl PartialEq for OpaqueHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

/// Unified value type for the whole engine
///
/// Three families matter to the engine:
/// - scalar leaves (`Null` .. `String`) are plain data;
/// - opaque leaves (`Bytes`, `Opaque`) are carried by reference and never
///   looked inside;
/// - recognized containers (`Array`, `Map`, `Facade`) are the values the
///   facade, traversal, and snapshot layers operate on.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit floating point
    F64(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes, stored by reference
    Bytes(Arc<[u8]>),
    /// Domain object the engine treats as an atomic leaf
    Opaque(OpaqueHandle),
    /// Ordered-sequence container
    Array(Arc<Vec<Value>>),
    /// Record container with insertion-ordered keys
    Map(Arc<Record>),
    /// A live recording facade embedded as a value
    Facade(Facade),
}

impl Value {
    /// Build an array container from a vector of values
    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Arc::new(values))
    }

    /// Build a record container from an ordered map
    pub fn map(record: Record) -> Value {
        Value::Map(Arc::new(record))
    }

    /// Build a record container from key/value pairs, preserving order
    pub fn map_from<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build a bytes leaf
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(Arc::from(bytes.into()))
    }

    /// Wrap a domain object as an opaque leaf
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Value {
        Value::Opaque(OpaqueHandle::new(value))
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the boolean if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer if this is an `I64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the float if this is an `F64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string slice if this is a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the byte slice if this is a `Bytes`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the element slice if this is an `Array`
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get the record if this is a `Map`
    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get the facade if this is a `Facade`
    pub fn as_facade(&self) -> Option<&Facade> {
        match self {
            Value::Facade(f) => Some(f),
            _ => None,
        }
    }

    /// Look up a record entry by key
    ///
    /// Returns `None` for non-record values. Convenient for navigating
    /// snapshot output.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Look up an array element by position
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Kind name used in error messages and logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Opaque(_) => "opaque",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Facade(_) => "facade",
        }
    }

    /// Identity predicate
    ///
    /// Containers, bytes, opaque leaves, and facades are identical only when
    /// they are the same allocation (or the same handle). Scalars are
    /// identical when equal; floats compare by bit pattern so NaN is
    /// identical to itself.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => Arc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => a.same(b),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Facade(a), Value::Facade(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Convert a JSON tree into a value tree
    ///
    /// Numbers become `I64` when they fit, `F64` otherwise. Object key order
    /// is preserved.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::I64(i),
                None => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(Arc::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            )),
        }
    }

    /// Convert a value tree back into JSON
    ///
    /// Returns `None` when the tree contains content JSON cannot carry:
    /// bytes, opaque leaves, live facades, or non-finite floats.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::I64(n) => Some(serde_json::Value::Number((*n).into())),
            Value::F64(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Bytes(_) | Value::Opaque(_) | Value::Facade(_) => None,
            Value::Array(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<Option<Vec<_>>>()
                .map(serde_json::Value::Array),
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| v.to_json().map(|j| (k.clone(), j)))
                .collect::<Option<serde_json::Map<_, _>>>()
                .map(serde_json::Value::Object),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::F64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}
