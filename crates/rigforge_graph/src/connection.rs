// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the rig graph.
//!
//! In memory an edge lives on the input port that holds it. In documents it
//! is a [`ConnectionRecord`] addressing both ends by decorated name:
//! `{"source": "mainSrt_M.offsetSrt", "target": "spine_M.parent", "targetIndex": 0}`.

use crate::document::{DocumentError, Map, MapExt, Value};
use crate::port::PortAddress;
use std::fmt;

/// Separator between a component's decorated name and a port name
pub const SEPARATOR: char = '.';

/// A resolved connection between two ports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Source output
    pub source: PortAddress,
    /// Target input
    pub target: PortAddress,
    /// Slot index on the target input
    pub index: usize,
}

/// A connection as written in a definition document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// `<decoratedName>.<outputName>`
    pub source: String,
    /// `<decoratedName>.<inputName>`
    pub target: String,
    /// Slot index on the target input
    pub target_index: usize,
}

impl ConnectionRecord {
    /// Build a record from its endpoint parts
    pub fn new(
        source_component: &str,
        output: &str,
        target_component: &str,
        input: &str,
        target_index: usize,
    ) -> Self {
        Self {
            source: format!("{source_component}{SEPARATOR}{output}"),
            target: format!("{target_component}{SEPARATOR}{input}"),
            target_index,
        }
    }

    /// Read a record from a document entry; `targetIndex` defaults to 0
    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        let map = value.as_map().ok_or(DocumentError::NotAMap(value.kind()))?;
        let source = map.required("source", "string", |v| v.as_str().map(str::to_string))?;
        let target = map.required("target", "string", |v| v.as_str().map(str::to_string))?;
        let target_index = map
            .optional("targetIndex", "non-negative integer", |v| {
                v.as_i64().and_then(|i| usize::try_from(i).ok())
            })?
            .unwrap_or(0);
        Ok(Self {
            source,
            target,
            target_index,
        })
    }

    /// Document form
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("source".to_string(), Value::from(self.source.as_str()));
        map.insert("target".to_string(), Value::from(self.target.as_str()));
        map.insert("targetIndex".to_string(), Value::from(self.target_index));
        Value::Map(map)
    }
}

impl fmt::Display for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Whether `name` can appear on either side of a port reference.
///
/// Component names, locations and port names must be non-empty and free of
/// [`SEPARATOR`], otherwise saved references could not be split again.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(SEPARATOR)
}

/// Split `decoratedName.portName` into its two halves.
///
/// Exactly one separator is allowed; anything else is `None`.
pub fn split_endpoint(reference: &str) -> Option<(&str, &str)> {
    let (component, port) = reference.split_once(SEPARATOR)?;
    if component.is_empty() || port.is_empty() || port.contains(SEPARATOR) {
        return None;
    }
    Some((component, port))
}
