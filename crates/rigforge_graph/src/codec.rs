// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion between document trees and their on-disk text form.
//!
//! Rich math values are rewritten as tagged maps before serialization:
//!
//! ```json
//! { "__mathObjectClass__": "Vec3", "__mathObjectData__": [0.0, 1.0, 0.0] }
//! ```
//!
//! This happens once, at the outermost save/load boundary. Component code only
//! ever sees [`Value`] trees.

use crate::document::{Map, Value};
use crate::math::{Quat, Vec3, Xfo};
use serde_json::Value as Json;
use std::path::Path;

const CLASS_KEY: &str = "__mathObjectClass__";
const DATA_KEY: &str = "__mathObjectData__";

/// Text format of a definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Rusty Object Notation
    Ron,
}

impl Format {
    /// Pick a format from a file extension (`.ron` is RON, anything else JSON)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Json,
        }
    }

    /// Serialize a document tree
    pub fn encode(&self, document: &Value) -> Result<Vec<u8>, CodecError> {
        let plain = prepare_to_save(document);
        match self {
            Self::Json => {
                let mut text = serde_json::to_vec_pretty(&plain)?;
                text.push(b'\n');
                Ok(text)
            }
            Self::Ron => {
                let text = ron::ser::to_string_pretty(&plain, ron::ser::PrettyConfig::default())?;
                Ok(text.into_bytes())
            }
        }
    }

    /// Parse a document tree
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let plain: Json = match self {
            Self::Json => serde_json::from_slice(bytes)?,
            Self::Ron => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| CodecError::Malformed(format!("not UTF-8: {e}")))?;
                ron::from_str(text)?
            }
        };
        prepare_to_load(plain)
    }
}

/// Strip rich values out of a document tree
pub fn prepare_to_save(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => float(*f),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(prepare_to_save).collect()),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), prepare_to_save(v)))
                .collect(),
        ),
        Value::Vec3(v) => tagged("Vec3", floats(&v.to_array())),
        Value::Quat(q) => tagged("Quat", floats(&q.to_array())),
        Value::Xfo(x) => {
            let mut data = serde_json::Map::new();
            data.insert("tr".to_string(), floats(&x.tr.to_array()));
            data.insert("ori".to_string(), floats(&x.ori.to_array()));
            data.insert("sc".to_string(), floats(&x.sc.to_array()));
            tagged("Xfo", Json::Object(data))
        }
    }
}

/// Rebuild rich values in a freshly parsed document tree
pub fn prepare_to_load(value: Json) -> Result<Value, CodecError> {
    Ok(match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(
            items
                .into_iter()
                .map(prepare_to_load)
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(mut object) => {
            if let Some(class) = object.remove(CLASS_KEY) {
                let data = object.remove(DATA_KEY).unwrap_or(Json::Null);
                return load_math_object(&class, &data);
            }
            Value::Map(
                object
                    .into_iter()
                    .map(|(k, v)| Ok((k, prepare_to_load(v)?)))
                    .collect::<Result<Map, CodecError>>()?,
            )
        }
    })
}

fn load_math_object(class: &Json, data: &Json) -> Result<Value, CodecError> {
    let class = class
        .as_str()
        .ok_or_else(|| CodecError::Malformed(format!("{CLASS_KEY} must be a string")))?;
    match class {
        "Vec3" => Ok(Value::Vec3(Vec3::from(read_floats::<3>(class, data)?))),
        "Quat" => Ok(Value::Quat(Quat::from(read_floats::<4>(class, data)?))),
        "Xfo" => {
            let field = |name: &str| {
                data.get(name)
                    .ok_or_else(|| CodecError::Malformed(format!("Xfo data is missing '{name}'")))
            };
            Ok(Value::Xfo(Xfo {
                tr: Vec3::from(read_floats::<3>("Xfo.tr", field("tr")?)?),
                ori: Quat::from(read_floats::<4>("Xfo.ori", field("ori")?)?),
                sc: Vec3::from(read_floats::<3>("Xfo.sc", field("sc")?)?),
            }))
        }
        other => Err(CodecError::UnknownMathClass(other.to_string())),
    }
}

fn read_floats<const N: usize>(what: &str, data: &Json) -> Result<[f64; N], CodecError> {
    let items = data
        .as_array()
        .filter(|items| items.len() == N)
        .ok_or_else(|| CodecError::Malformed(format!("{what} expects an array of {N} numbers")))?;
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item
            .as_f64()
            .ok_or_else(|| CodecError::Malformed(format!("{what} expects numbers, found {item}")))?;
    }
    Ok(out)
}

fn tagged(class: &str, data: Json) -> Json {
    let mut object = serde_json::Map::new();
    object.insert(CLASS_KEY.to_string(), Json::String(class.to_string()));
    object.insert(DATA_KEY.to_string(), data);
    Json::Object(object)
}

fn floats(values: &[f64]) -> Json {
    Json::Array(values.iter().copied().map(float).collect())
}

// JSON has no NaN/inf; those degrade to null like serde_json does for f64.
fn float(f: f64) -> Json {
    serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number)
}

/// Error encoding or decoding a definition document
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON syntax or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON serialization error
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// RON syntax error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// A tagged math object names a class we don't know
    #[error("Unknown math object class: {0}")]
    UnknownMathClass(String),

    /// A tagged math object has the wrong shape
    #[error("Malformed document: {0}")]
    Malformed(String),
}
