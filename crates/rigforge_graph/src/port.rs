// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for component inputs/outputs.

use crate::component::ComponentId;
use crate::connection::is_valid_name;
use crate::document::{DocumentError, Map, MapExt, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// Data type that can flow through ports
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    /// Transform
    #[default]
    Xfo,
    /// 3D vector
    Vec3,
    /// Quaternion
    Quat,
    /// Floating point scalar
    Float,
    /// Integer scalar
    Integer,
    /// Boolean
    Boolean,
    /// String
    String,
    /// Any other type tag
    Custom(String),
}

impl DataType {
    /// The type tag as written in documents
    pub fn as_str(&self) -> &str {
        match self {
            Self::Xfo => "Xfo",
            Self::Vec3 => "Vec3",
            Self::Quat => "Quat",
            Self::Float => "Float",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for DataType {
    fn from(tag: &str) -> Self {
        match tag {
            "Xfo" => Self::Xfo,
            "Vec3" => Self::Vec3,
            "Quat" => Self::Quat,
            "Float" => Self::Float,
            "Integer" => Self::Integer,
            "Boolean" => Self::Boolean,
            "String" => Self::String,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for DataType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-owning reference to a port: owning component plus port name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortAddress {
    /// Owning component
    pub component: ComponentId,
    /// Port name within its direction
    pub port: String,
}

impl PortAddress {
    /// Create a new address
    pub fn new(component: ComponentId, port: impl Into<String>) -> Self {
        Self {
            component,
            port: port.into(),
        }
    }
}

/// A port on a component
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    /// Owning component
    owner: ComponentId,
    /// Port name
    name: String,
    /// Port direction
    direction: PortDirection,
    /// Data type
    data_type: DataType,
    /// Source output (inputs only)
    connection: Option<PortAddress>,
    /// Slot index of the incoming connection (inputs only)
    index: usize,
    /// Inputs fed by this port (outputs only)
    dependents: Vec<PortAddress>,
}

impl Port {
    /// Create a new port
    pub fn new(
        owner: ComponentId,
        name: impl Into<String>,
        data_type: DataType,
        direction: PortDirection,
    ) -> Self {
        Self {
            owner,
            name: name.into(),
            direction,
            data_type,
            connection: None,
            index: 0,
            dependents: Vec::new(),
        }
    }

    /// Create a new input port
    pub fn input(owner: ComponentId, name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(owner, name, data_type, PortDirection::Input)
    }

    /// Create a new output port
    pub fn output(owner: ComponentId, name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(owner, name, data_type, PortDirection::Output)
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port direction
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Data type
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Owning component
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    /// Address of this port
    pub fn address(&self) -> PortAddress {
        PortAddress::new(self.owner, self.name.clone())
    }

    /// Source output this input is connected to
    pub fn connection(&self) -> Option<&PortAddress> {
        self.connection.as_ref()
    }

    /// Whether this input has a source
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Slot index of the incoming connection
    pub fn index(&self) -> usize {
        self.index
    }

    /// Set the slot index of the incoming connection
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Inputs fed by this output
    pub fn dependents(&self) -> &[PortAddress] {
        &self.dependents
    }

    /// Check that `source` may feed this port
    pub fn check_connection(&self, source: &Port) -> Result<(), PortError> {
        if self.direction != PortDirection::Input {
            return Err(PortError::InvalidArgument(format!(
                "'{}' is an output and cannot receive a connection",
                self.name
            )));
        }
        if source.direction != PortDirection::Output {
            return Err(PortError::InvalidArgument(format!(
                "only outputs can be connected to inputs, '{}' is an {}",
                source.name, source.direction
            )));
        }
        if source.data_type != self.data_type {
            return Err(PortError::TypeMismatch {
                input: self.data_type.clone(),
                output: source.data_type.clone(),
            });
        }
        Ok(())
    }

    /// Record `source` as this input's connection.
    ///
    /// Only the input side is written here; the output's dependent list lives
    /// on another component and is updated by the owning rig.
    pub fn set_connection(&mut self, source: &Port) -> Result<(), PortError> {
        self.check_connection(source)?;
        self.connection = Some(source.address());
        Ok(())
    }

    /// Clear this input's connection, returning the output it pointed at
    pub fn take_connection(&mut self) -> Option<PortAddress> {
        self.index = 0;
        self.connection.take()
    }

    pub(crate) fn add_dependent(&mut self, input: PortAddress) {
        if !self.dependents.contains(&input) {
            self.dependents.push(input);
        }
    }

    pub(crate) fn remove_dependent(&mut self, input: &PortAddress) {
        self.dependents.retain(|d| d != input);
    }

    pub(crate) fn remove_dependents_of(&mut self, component: ComponentId) {
        self.dependents.retain(|d| d.component != component);
    }

    /// Document form: `{"name": .., "dataType": ..}`
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::from(self.name.as_str()));
        map.insert("dataType".to_string(), Value::from(self.data_type.as_str()));
        Value::Map(map)
    }
}

/// Name and type of a port, before it is attached to a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    /// Port name
    pub name: String,
    /// Data type
    pub data_type: DataType,
}

impl PortSpec {
    /// Create a new port spec
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Read a port spec from its document form
    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        let map = value.as_map().ok_or(DocumentError::NotAMap(value.kind()))?;
        let name = map.required("name", "string", |v| v.as_str().map(str::to_string))?;
        if !is_valid_name(&name) {
            return Err(DocumentError::InvalidName {
                field: "name".to_string(),
                name,
            });
        }
        let data_type = map
            .optional_str("dataType")?
            .map(DataType::from)
            .unwrap_or_default();
        Ok(Self { name, data_type })
    }
}

/// Error when connecting ports
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// Data types differ
    #[error("Connected output data type '{output}' does not match input data type '{input}'")]
    TypeMismatch {
        /// Type of the input being connected
        input: DataType,
        /// Type of the output offered as source
        output: DataType,
    },

    /// Wrong kind of port on either end
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_tags() {
        assert_eq!(DataType::from("Xfo"), DataType::Xfo);
        assert_eq!(DataType::from("Float"), DataType::Float);
        assert_eq!(DataType::from("Curve"), DataType::Custom("Curve".to_string()));
        assert_eq!(DataType::Custom("Curve".to_string()).to_string(), "Curve");
    }

    #[test]
    fn test_tags_are_kept_verbatim() {
        let scalar = DataType::from("Scalar");
        assert_eq!(scalar, DataType::Custom("Scalar".to_string()));
        assert_eq!(String::from(scalar.clone()), "Scalar");

        // Distinct tags never connect
        let out = Port::output(ComponentId::new(), "out", scalar);
        let input = Port::input(ComponentId::new(), "in", DataType::Float);
        assert!(matches!(
            input.check_connection(&out),
            Err(PortError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_connect_same_type() {
        let a = ComponentId::new();
        let b = ComponentId::new();
        let out = Port::output(a, "out", DataType::Xfo);
        let mut input = Port::input(b, "in", DataType::Xfo);

        input.set_connection(&out).unwrap();
        assert_eq!(input.connection(), Some(&PortAddress::new(a, "out")));
    }

    #[test]
    fn test_type_mismatch() {
        let out = Port::output(ComponentId::new(), "out", DataType::Vec3);
        let mut input = Port::input(ComponentId::new(), "in", DataType::Xfo);

        let err = input.set_connection(&out).unwrap_err();
        assert_eq!(
            err,
            PortError::TypeMismatch {
                input: DataType::Xfo,
                output: DataType::Vec3,
            }
        );
        assert!(err.to_string().contains("Vec3") && err.to_string().contains("Xfo"));
        assert!(!input.is_connected());
    }

    #[test]
    fn test_input_as_source_rejected() {
        let other_input = Port::input(ComponentId::new(), "in", DataType::Xfo);
        let mut input = Port::input(ComponentId::new(), "in", DataType::Xfo);

        let err = input.set_connection(&other_input).unwrap_err();
        assert!(matches!(err, PortError::InvalidArgument(_)));
    }

    #[test]
    fn test_take_connection() {
        let out = Port::output(ComponentId::new(), "out", DataType::Float);
        let mut input = Port::input(ComponentId::new(), "in", DataType::Float);

        assert_eq!(input.take_connection(), None);

        input.set_connection(&out).unwrap();
        input.set_index(2);
        assert_eq!(input.take_connection(), Some(out.address()));
        assert!(!input.is_connected());
        assert_eq!(input.index(), 0);
    }

    #[test]
    fn test_port_spec_from_value() {
        let port = Port::output(ComponentId::new(), "tip", DataType::Vec3);
        let spec = PortSpec::from_value(&port.to_value()).unwrap();
        assert_eq!(spec, PortSpec::new("tip", DataType::Vec3));
    }

    #[test]
    fn test_port_spec_dotted_name_rejected() {
        let port = Port::output(ComponentId::new(), "tip.x", DataType::Vec3);
        assert!(matches!(
            PortSpec::from_value(&port.to_value()),
            Err(DocumentError::InvalidName { ref name, .. }) if name == "tip.x"
        ));
    }
}
