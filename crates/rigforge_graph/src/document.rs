// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory document tree exchanged between the rig and its components.
//!
//! A [`Value`] tree is what `save_data`/`load_data` produce and consume. It may
//! hold rich math values ([`Vec3`], [`Quat`], [`Xfo`]); the codec strips those
//! down to plain JSON-compatible data only at the file boundary.

use crate::math::{Quat, Vec3, Xfo};
use indexmap::IndexMap;

/// Ordered string-keyed mapping
pub type Map = IndexMap<String, Value>;

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / null
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    String(String),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Ordered mapping
    Map(Map),
    /// 3D vector
    Vec3(Vec3),
    /// Quaternion
    Quat(Quat),
    /// Transform
    Xfo(Xfo),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Vec3(_) => "Vec3",
            Self::Quat(_) => "Quat",
            Self::Xfo(_) => "Xfo",
        }
    }

    /// Borrow as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as an integer (floats with no fractional part are accepted)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Read as a float (integers are widened)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Borrow as an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a map
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Read as a transform
    pub fn as_xfo(&self) -> Option<Xfo> {
        match self {
            Self::Xfo(x) => Some(*x),
            _ => None,
        }
    }

    /// Read a two element numeric array as a 2D position
    pub fn as_position(&self) -> Option<[f32; 2]> {
        match self.as_array()? {
            [x, y] => Some([x.as_f64()? as f32, y.as_f64()? as f32]),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Int(i as i64)
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

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Quat> for Value {
    fn from(q: Quat) -> Self {
        Self::Quat(q)
    }
}

impl From<Xfo> for Value {
    fn from(x: Xfo) -> Self {
        Self::Xfo(x)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

impl From<[f32; 2]> for Value {
    fn from([x, y]: [f32; 2]) -> Self {
        Self::Array(vec![Self::Float(f64::from(x)), Self::Float(f64::from(y))])
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Error reading a field out of a document slice
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    /// A required field is absent
    #[error("Missing field '{0}'")]
    MissingField(String),

    /// A field holds the wrong kind of value
    #[error("Field '{field}' should be {expected}, found {found}")]
    InvalidField {
        /// Field name
        field: String,
        /// What the field should hold
        expected: &'static str,
        /// What it actually holds
        found: &'static str,
    },

    /// The document root is not a map
    #[error("Expected a map document, found {0}")]
    NotAMap(&'static str),

    /// A name that is empty or contains the port reference separator
    #[error("Field '{field}' has invalid name '{name}': names must be non-empty and must not contain '.'")]
    InvalidName {
        /// Field name
        field: String,
        /// Offending name
        name: String,
    },

    /// A name that must be unique within a list appears twice
    #[error("Duplicate entry '{name}' in '{field}'")]
    Duplicate {
        /// List field name
        field: String,
        /// Repeated name
        name: String,
    },
}

/// Typed field access on a document map
pub trait MapExt {
    /// Fetch a required field
    fn require(&self, field: &str) -> Result<&Value, DocumentError>;

    /// Fetch an optional field and convert it, failing if present but ill-typed
    fn optional<T>(
        &self,
        field: &str,
        expected: &'static str,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<Option<T>, DocumentError>;

    /// Fetch a required field and convert it
    fn required<T>(
        &self,
        field: &str,
        expected: &'static str,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<T, DocumentError> {
        self.optional(field, expected, read)?
            .ok_or_else(|| DocumentError::MissingField(field.to_string()))
    }

    /// Fetch an optional string field
    fn optional_str(&self, field: &str) -> Result<Option<&str>, DocumentError>;
}

impl MapExt for Map {
    fn require(&self, field: &str) -> Result<&Value, DocumentError> {
        self.get(field)
            .ok_or_else(|| DocumentError::MissingField(field.to_string()))
    }

    fn optional<T>(
        &self,
        field: &str,
        expected: &'static str,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<Option<T>, DocumentError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => read(value).map(Some).ok_or(DocumentError::InvalidField {
                field: field.to_string(),
                expected,
                found: value.kind(),
            }),
        }
    }

    fn optional_str(&self, field: &str) -> Result<Option<&str>, DocumentError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(DocumentError::InvalidField {
                field: field.to_string(),
                expected: "string",
                found: other.kind(),
            }),
        }
    }
}
