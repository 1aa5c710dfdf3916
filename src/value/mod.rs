//! Value Module
//!
//! Native values stored by TagKV and their tagged on-disk encoding.
//!
//! ## Payload Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ ':' (1)  │         Body                │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Tags
//! - `i`: INT   - Body: decimal ASCII (booleans stored as 0/1)
//! - `f`: FLOAT - Body: shortest round-trip ASCII
//! - `s`: STR   - Body: UTF-8 text
//! - `d`: DICT  - Body: JSON object
//! - `l`: LIST  - Body: JSON array
//! - `t`: TUPLE - Body: JSON array

mod codec;
mod tag;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TagKvError};

pub use codec::{decode, decode_typed, encode, TAG_HEADER_SIZE};
pub use tag::Tag;

/// A native value that can be stored under a key
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    /// Stored under the INT tag; reads back as `Int`
    Bool(bool),
    Dict(BTreeMap<String, Value>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Only meaningful nested inside a structured value
    Null,
}

/// The closed set of native types a read can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    Str,
    Bool,
    Dict,
    List,
    Tuple,
    Null,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::Bool => "bool",
            ValueType::Dict => "dict",
            ValueType::List => "list",
            ValueType::Tuple => "tuple",
            ValueType::Null => "null",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Get the native type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Bool(_) => ValueType::Bool,
            Value::Dict(_) => ValueType::Dict,
            Value::List(_) => ValueType::List,
            Value::Tuple(_) => ValueType::Tuple,
            Value::Null => ValueType::Null,
        }
    }

    /// Look up a field of a `Dict` value
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Dict(map) => map.get(name),
            _ => None,
        }
    }

    /// Convert into a JSON tree
    ///
    /// Tuples become arrays. Fails for non-finite floats, which JSON
    /// cannot represent.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    TagKvError::UnsupportedType(format!(
                        "non-finite float {} in structured value",
                        f
                    ))
                })?,
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Dict(map) => {
                let mut object = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    object.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(object)
            }
            Value::List(items) | Value::Tuple(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<Vec<_>>>()?,
            ),
            Value::Null => serde_json::Value::Null,
        })
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Dict(map)
    }
}

/// JSON integers that overflow `i64` fall back to `Float`
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Dict(
                object
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
