// SPDX-License-Identifier: MIT OR Apache-2.0
//! Component definitions for the rig graph.
//!
//! A [`Component`] carries the state every component shares (identity, ports,
//! layout hint) and delegates its type-specific parameters to a boxed
//! [`ComponentKind`].

use crate::connection::is_valid_name;
use crate::document::{DocumentError, Map, MapExt, Value};
use crate::port::{Port, PortDirection, PortSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub Uuid);

impl ComponentId {
    /// Create a new random component ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Type-specific behaviour of a component.
///
/// Implementations own the component's parameters. Guide kinds turn their
/// authoring parameters into concrete values in [`ComponentKind::build_params`];
/// rig kinds usually store build data as-is.
pub trait ComponentKind: fmt::Debug {
    /// Fully-qualified type identifier, e.g. `rigforge.components.main_srt.MainSrtComponentGuide`
    fn type_name(&self) -> &str;

    /// Type identifier written into build data
    fn build_type_name(&self) -> &str {
        self.type_name()
    }

    /// Name used when none is given at construction
    fn default_name(&self) -> &str;

    /// Input ports created with the component
    fn default_inputs(&self) -> Vec<PortSpec> {
        Vec::new()
    }

    /// Output ports created with the component
    fn default_outputs(&self) -> Vec<PortSpec> {
        Vec::new()
    }

    /// Read type-specific parameters from a component document
    fn load_params(&mut self, data: &Map) -> Result<(), DocumentError>;

    /// Write authoring parameters
    fn save_params(&self, data: &mut Map);

    /// Write resolved parameters for a builder
    fn build_params(&self, data: &mut Map) {
        self.save_params(data);
    }
}

/// A component instance in the rig
#[derive(Debug)]
pub struct Component {
    /// Unique instance ID
    id: ComponentId,
    /// Authoring name
    name: String,
    /// Side tag (`L`, `R`, `M`, ...)
    location: Option<String>,
    /// Input ports
    inputs: Vec<Port>,
    /// Output ports
    outputs: Vec<Port>,
    /// Position in the graph view
    graph_position: [f32; 2],
    /// Type-specific state
    kind: Box<dyn ComponentKind>,
}

impl Component {
    /// Create a new component of the given kind with its default ports
    pub fn new(kind: Box<dyn ComponentKind>, name: Option<&str>) -> Self {
        let id = ComponentId::new();
        let name = name.unwrap_or_else(|| kind.default_name()).to_string();
        let inputs = kind
            .default_inputs()
            .into_iter()
            .map(|spec| Port::input(id, spec.name, spec.data_type))
            .collect();
        let outputs = kind
            .default_outputs()
            .into_iter()
            .map(|spec| Port::output(id, spec.name, spec.data_type))
            .collect();
        Self {
            id,
            name,
            location: None,
            inputs,
            outputs,
            graph_position: [0.0, 0.0],
            kind,
        }
    }

    /// Set the location tag
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the graph position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.graph_position = [x, y];
        self
    }

    /// Instance ID
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Authoring name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the component
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Location tag
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Set or clear the location tag
    pub fn set_location(&mut self, location: Option<String>) {
        self.location = location;
    }

    /// Name plus location suffix; the component's address within a rig
    pub fn decorated_name(&self) -> String {
        decorate(&self.name, self.location.as_deref())
    }

    /// First name, location or port name that cannot be used in a port reference
    pub fn invalid_name(&self) -> Option<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.location.as_deref())
            .chain(self.inputs.iter().map(Port::name))
            .chain(self.outputs.iter().map(Port::name))
            .find(|name| !is_valid_name(name))
    }

    /// Fully-qualified type identifier
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Type-specific state
    pub fn kind(&self) -> &dyn ComponentKind {
        self.kind.as_ref()
    }

    /// Graph view position
    pub fn graph_position(&self) -> [f32; 2] {
        self.graph_position
    }

    /// Set the graph view position
    pub fn set_graph_position(&mut self, position: [f32; 2]) {
        self.graph_position = position;
    }

    /// All input ports, in order
    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    /// All output ports, in order
    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Number of input ports
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output ports
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Get an input port by index
    pub fn input_by_index(&self, index: usize) -> Option<&Port> {
        self.inputs.get(index)
    }

    /// Get an output port by index
    pub fn output_by_index(&self, index: usize) -> Option<&Port> {
        self.outputs.get(index)
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name() == name)
    }

    /// Get an output port by name
    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name() == name)
    }

    pub(crate) fn input_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.inputs.iter_mut().find(|p| p.name() == name)
    }

    pub(crate) fn output_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.outputs.iter_mut().find(|p| p.name() == name)
    }

    pub(crate) fn inputs_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.inputs.iter_mut()
    }

    pub(crate) fn outputs_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.outputs.iter_mut()
    }

    /// Add an input port; returns `false` if the name is taken or invalid
    pub fn add_input(&mut self, spec: PortSpec) -> bool {
        if !is_valid_name(&spec.name) || self.input(&spec.name).is_some() {
            return false;
        }
        self.inputs.push(Port::input(self.id, spec.name, spec.data_type));
        true
    }

    /// Add an output port; returns `false` if the name is taken or invalid
    pub fn add_output(&mut self, spec: PortSpec) -> bool {
        if !is_valid_name(&spec.name) || self.output(&spec.name).is_some() {
            return false;
        }
        self.outputs.push(Port::output(self.id, spec.name, spec.data_type));
        true
    }

    /// Populate this component from its document slice.
    ///
    /// When the document lists `inputs`/`outputs` the port set is replaced by
    /// that list. Ports whose name and type are unchanged keep their
    /// connection state; use [`crate::Rig::load_component_data`] on a component
    /// that is already wired so stale references are dropped.
    ///
    /// The header and ports are only applied once the whole slice has been
    /// read and the kind has accepted its parameters.
    pub fn load_data(&mut self, data: &Map) -> Result<(), DocumentError> {
        let name = data.optional_str("name")?;
        let location = data.optional_str("location")?;
        for (field, value) in [("name", name), ("location", location)] {
            if let Some(value) = value.filter(|v| !is_valid_name(v)) {
                return Err(DocumentError::InvalidName {
                    field: field.to_string(),
                    name: value.to_string(),
                });
            }
        }
        let inputs = read_port_specs(data, "inputs")?;
        let outputs = read_port_specs(data, "outputs")?;
        self.kind.load_params(data)?;

        if let Some(name) = name {
            self.name = name.to_string();
        }
        if let Some(location) = location {
            self.location = Some(location.to_string());
        }
        if let Some(specs) = inputs {
            self.inputs = reconcile_ports(
                std::mem::take(&mut self.inputs),
                specs,
                self.id,
                PortDirection::Input,
            );
        }
        if let Some(specs) = outputs {
            self.outputs = reconcile_ports(
                std::mem::take(&mut self.outputs),
                specs,
                self.id,
                PortDirection::Output,
            );
        }
        Ok(())
    }

    /// Authoring document: enough to rebuild an equivalent component
    pub fn save_data(&self) -> Map {
        let mut data = self.header(self.kind.type_name());
        self.kind.save_params(&mut data);
        data
    }

    /// Build document: resolved parameters for a builder, no layout
    pub fn rig_build_data(&self) -> Map {
        let mut data = self.header(self.kind.build_type_name());
        self.kind.build_params(&mut data);
        data
    }

    fn header(&self, class: &str) -> Map {
        let mut data = Map::new();
        data.insert("class".to_string(), Value::from(class));
        data.insert("name".to_string(), Value::from(self.name.as_str()));
        if let Some(location) = &self.location {
            data.insert("location".to_string(), Value::from(location.as_str()));
        }
        data.insert(
            "inputs".to_string(),
            Value::Array(self.inputs.iter().map(Port::to_value).collect()),
        );
        data.insert(
            "outputs".to_string(),
            Value::Array(self.outputs.iter().map(Port::to_value).collect()),
        );
        data
    }
}

/// `name`, or `name_location` when a location is set
pub(crate) fn decorate(name: &str, location: Option<&str>) -> String {
    match location {
        Some(location) => format!("{name}_{location}"),
        None => name.to_string(),
    }
}

fn read_port_specs(data: &Map, field: &str) -> Result<Option<Vec<PortSpec>>, DocumentError> {
    let items = match data.get(field) {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(DocumentError::InvalidField {
                field: field.to_string(),
                expected: "array",
                found: other.kind(),
            })
        }
    };
    let mut specs: Vec<PortSpec> = Vec::with_capacity(items.len());
    for item in items {
        let spec = PortSpec::from_value(item)?;
        if specs.iter().any(|s| s.name == spec.name) {
            return Err(DocumentError::Duplicate {
                field: field.to_string(),
                name: spec.name,
            });
        }
        specs.push(spec);
    }
    Ok(Some(specs))
}

fn reconcile_ports(
    mut existing: Vec<Port>,
    specs: Vec<PortSpec>,
    owner: ComponentId,
    direction: PortDirection,
) -> Vec<Port> {
    specs
        .into_iter()
        .map(|spec| {
            match existing
                .iter()
                .position(|p| p.name() == spec.name && *p.data_type() == spec.data_type)
            {
                Some(pos) => existing.swap_remove(pos),
                None => Port::new(owner, spec.name, spec.data_type, direction),
            }
        })
        .collect()
}
