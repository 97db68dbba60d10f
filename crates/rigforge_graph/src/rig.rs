// SPDX-License-Identifier: MIT OR Apache-2.0
//! The rig: top-level container of a component graph.
//!
//! Loading a definition document runs in three strict phases:
//!
//! 1. every entry of `components` is resolved, constructed and loaded;
//! 2. only then `connections` are resolved by decorated name;
//! 3. `graphPositions` are applied, skipping names that match nothing.
//!
//! Saving walks the components in order and emits the same three sections, so
//! loading a saved document reproduces the graph.

use crate::codec::{CodecError, Format};
use crate::component::{decorate, Component, ComponentId};
use crate::connection::{is_valid_name, split_endpoint, Connection, ConnectionRecord};
use crate::document::{DocumentError, Map, MapExt, Value};
use crate::port::{PortAddress, PortDirection, PortError};
use crate::profiler::Profiler;
use crate::registry::{ComponentRegistry, TypeResolutionError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Default rig name
pub const DEFAULT_RIG_NAME: &str = "rig";

/// How connection records that land on the same input are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPolicy {
    /// A later record on the same input replaces the earlier one; indices are not checked
    #[default]
    Permissive,
    /// A second record on an input already connected during the same load is an error
    Strict,
}

/// Which representation of the rig to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// Authoring state (`save_data` per component)
    Guide,
    /// Resolved builder input (`rig_build_data` per component)
    Build,
}

/// Services a load needs: type registry, profiler and connection policy
#[derive(Debug)]
pub struct RigContext {
    /// Component type registry
    pub registry: ComponentRegistry,
    /// Profiler (disabled by default)
    pub profiler: Profiler,
    /// Connection policy
    pub policy: ConnectionPolicy,
}

impl RigContext {
    /// Create a context around a registry
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            profiler: Profiler::disabled(),
            policy: ConnectionPolicy::default(),
        }
    }

    /// Use the given profiler
    pub fn with_profiler(mut self, profiler: Profiler) -> Self {
        self.profiler = profiler;
        self
    }

    /// Use the given connection policy
    pub fn with_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for RigContext {
    fn default() -> Self {
        Self::new(ComponentRegistry::with_standard_components())
    }
}

/// A non-component child of the rig (not part of the component graph)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Layer name
    pub name: String,
}

impl Layer {
    /// Create a new layer
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A rig: named container of components and the connections between them
#[derive(Debug)]
pub struct Rig {
    /// Rig name
    name: String,
    /// Components, in insertion order
    components: IndexMap<ComponentId, Component>,
    /// Non-component children
    layers: Vec<Layer>,
}

impl Rig {
    /// Create a new empty rig
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: IndexMap::new(),
            layers: Vec::new(),
        }
    }

    /// Rig name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a layer
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// All layers
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Add a component; its decorated name must not already be in use
    pub fn add_component(&mut self, component: Component) -> Result<ComponentId, RigError> {
        if let Some(name) = component.invalid_name() {
            return Err(RigError::InvalidName(name.to_string()));
        }
        let decorated = component.decorated_name();
        if self.component_id(&decorated).is_some() {
            return Err(RigError::DuplicateComponent(decorated));
        }
        let id = component.id();
        tracing::debug!(component = %decorated, type_name = component.type_name(), "added component");
        self.components.insert(id, component);
        Ok(id)
    }

    /// Remove a component and every connection touching it
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Component> {
        let mut component = self.components.shift_remove(&id)?;

        // Inputs of others fed by this component
        for other in self.components.values_mut() {
            for input in other.inputs_mut() {
                if input.connection().is_some_and(|c| c.component == id) {
                    input.take_connection();
                }
            }
            for output in other.outputs_mut() {
                output.remove_dependents_of(id);
            }
        }
        // The removed component keeps no references into the rig
        for input in component.inputs_mut() {
            input.take_connection();
        }
        for output in component.outputs_mut() {
            let dependents = output.dependents().to_vec();
            for dependent in &dependents {
                output.remove_dependent(dependent);
            }
        }
        Some(component)
    }

    /// Get a component by ID
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Look up a component by decorated name
    pub fn component_by_decorated_name(&self, decorated_name: &str) -> Option<&Component> {
        self.components
            .values()
            .find(|c| c.decorated_name() == decorated_name)
    }

    /// Look up a component's ID by decorated name
    pub fn component_id(&self, decorated_name: &str) -> Option<ComponentId> {
        self.component_by_decorated_name(decorated_name)
            .map(Component::id)
    }

    /// All components, in insertion order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Number of components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Set a component's graph position
    pub fn set_graph_position(&mut self, id: ComponentId, position: [f32; 2]) -> Result<(), RigError> {
        self.components
            .get_mut(&id)
            .ok_or(RigError::ComponentNotFound(id))?
            .set_graph_position(position);
        Ok(())
    }

    /// Rename a component, keeping decorated names unique
    pub fn rename_component(
        &mut self,
        id: ComponentId,
        name: &str,
        location: Option<&str>,
    ) -> Result<(), RigError> {
        if let Some(invalid) = std::iter::once(name)
            .chain(location)
            .find(|n| !is_valid_name(n))
        {
            return Err(RigError::InvalidName(invalid.to_string()));
        }
        let decorated = decorate(name, location);
        if self.component_id(&decorated).is_some_and(|other| other != id) {
            return Err(RigError::DuplicateComponent(decorated));
        }
        let component = self
            .components
            .get_mut(&id)
            .ok_or(RigError::ComponentNotFound(id))?;
        component.set_name(name);
        component.set_location(location.map(str::to_string));
        Ok(())
    }

    /// Reload a component that may already be wired.
    ///
    /// Connections to ports that no longer exist afterwards are dropped on
    /// both ends. A document whose decorated name collides with a sibling is
    /// rejected before anything is applied.
    pub fn load_component_data(&mut self, id: ComponentId, data: &Map) -> Result<(), RigError> {
        let component = self
            .components
            .get(&id)
            .ok_or(RigError::ComponentNotFound(id))?;
        let name = data.optional_str("name")?.unwrap_or(component.name());
        let location = data.optional_str("location")?.or(component.location());
        let decorated = decorate(name, location);
        if self
            .components
            .values()
            .any(|c| c.id() != id && c.decorated_name() == decorated)
        {
            return Err(RigError::DuplicateComponent(decorated));
        }

        self.components
            .get_mut(&id)
            .ok_or(RigError::ComponentNotFound(id))?
            .load_data(data)?;
        self.prune_dangling();
        Ok(())
    }

    /// Connect `source.output` to `target.input`, replacing any previous source of that input
    pub fn connect(
        &mut self,
        source: ComponentId,
        output: &str,
        target: ComponentId,
        input: &str,
        index: usize,
    ) -> Result<(), RigError> {
        let source_port = self
            .components
            .get(&source)
            .ok_or(RigError::ComponentNotFound(source))?
            .output(output)
            .ok_or_else(|| RigError::PortNotFound {
                component: source,
                port: output.to_string(),
                direction: PortDirection::Output,
            })?
            .clone();

        let target_port = self
            .components
            .get_mut(&target)
            .ok_or(RigError::ComponentNotFound(target))?
            .input_mut(input)
            .ok_or_else(|| RigError::PortNotFound {
                component: target,
                port: input.to_string(),
                direction: PortDirection::Input,
            })?;

        target_port.check_connection(&source_port)?;
        let previous = target_port.take_connection();
        target_port.set_connection(&source_port)?;
        target_port.set_index(index);
        let input_address = target_port.address();

        if let Some(previous) = previous {
            if let Some(port) = self.output_port_mut(&previous) {
                port.remove_dependent(&input_address);
            }
        }
        if let Some(port) = self.output_port_mut(&source_port.address()) {
            port.add_dependent(input_address);
        }
        Ok(())
    }

    /// Disconnect an input; returns the output it was connected to
    pub fn disconnect(
        &mut self,
        target: ComponentId,
        input: &str,
    ) -> Result<Option<PortAddress>, RigError> {
        let port = self
            .components
            .get_mut(&target)
            .ok_or(RigError::ComponentNotFound(target))?
            .input_mut(input)
            .ok_or_else(|| RigError::PortNotFound {
                component: target,
                port: input.to_string(),
                direction: PortDirection::Input,
            })?;
        let input_address = port.address();
        let previous = port.take_connection();
        if let Some(previous) = &previous {
            if let Some(output) = self.output_port_mut(previous) {
                output.remove_dependent(&input_address);
            }
        }
        Ok(previous)
    }

    /// The output port feeding `target.input`, if connected
    pub fn connection_source(&self, target: ComponentId, input: &str) -> Option<&crate::port::Port> {
        let address = self.components.get(&target)?.input(input)?.connection()?;
        self.components.get(&address.component)?.output(&address.port)
    }

    /// Every connection, ordered by target component then input
    pub fn connections(&self) -> Vec<Connection> {
        self.components
            .values()
            .flat_map(|component| component.inputs())
            .filter_map(|input| {
                input.connection().map(|source| Connection {
                    source: source.clone(),
                    target: input.address(),
                    index: input.index(),
                })
            })
            .collect()
    }

    /// Every connection as a record addressed by decorated names
    pub fn connection_records(&self) -> Vec<ConnectionRecord> {
        let mut records = Vec::new();
        for component in self.components.values() {
            for input in component.inputs() {
                let Some(source) = input.connection() else {
                    continue;
                };
                let Some(source_component) = self.components.get(&source.component) else {
                    tracing::warn!(input = %input.name(), "skipping connection to a component outside the rig");
                    continue;
                };
                records.push(ConnectionRecord::new(
                    &source_component.decorated_name(),
                    &source.port,
                    &component.decorated_name(),
                    input.name(),
                    input.index(),
                ));
            }
        }
        records
    }

    fn output_port_mut(&mut self, address: &PortAddress) -> Option<&mut crate::port::Port> {
        self.components
            .get_mut(&address.component)?
            .output_mut(&address.port)
    }

    /// Drop edges that are not recorded on both the input and the output
    fn prune_dangling(&mut self) {
        let from_inputs: HashSet<(PortAddress, PortAddress)> = self
            .components
            .values()
            .flat_map(|c| c.inputs())
            .filter_map(|input| Some((input.connection()?.clone(), input.address())))
            .collect();
        let live: HashSet<(PortAddress, PortAddress)> = self
            .components
            .values()
            .flat_map(|c| c.outputs())
            .flat_map(|output| {
                let address = output.address();
                output
                    .dependents()
                    .iter()
                    .map(move |dependent| (address.clone(), dependent.clone()))
            })
            .filter(|edge| from_inputs.contains(edge))
            .collect();

        for component in self.components.values_mut() {
            for input in component.inputs_mut() {
                let stale = input
                    .connection()
                    .is_some_and(|source| !live.contains(&(source.clone(), input.address())));
                if stale {
                    tracing::debug!(input = %input.name(), "dropping connection to a replaced output");
                    input.take_connection();
                }
            }
            for output in component.outputs_mut() {
                let address = output.address();
                let stale: Vec<PortAddress> = output
                    .dependents()
                    .iter()
                    .filter(|d| !live.contains(&(address.clone(), (*d).clone())))
                    .cloned()
                    .collect();
                for dependent in &stale {
                    output.remove_dependent(dependent);
                }
            }
        }
    }

    // ========================
    // Definition documents
    // ========================

    /// Assemble the rig from a definition document
    pub fn load_rig_definition(
        &mut self,
        ctx: &mut RigContext,
        document: &Value,
    ) -> Result<(), RigError> {
        let _scope = ctx.profiler.scope(format!("loadRigDefinition:{}", self.name));

        let document = document
            .as_map()
            .ok_or(DocumentError::NotAMap(document.kind()))?;

        if let Some(name) = document.optional_str("name")? {
            self.name = name.to_string();
        }

        if let Some(components) = document.get("components") {
            let components = list_field("components", components)?;
            self.load_components(&mut ctx.registry, &ctx.profiler, components)?;

            if let Some(connections) = document.get("connections") {
                let connections = list_field("connections", connections)?;
                self.make_connections(ctx.policy, &ctx.profiler, connections)?;
            }
        }

        if let Some(positions) = document.get("graphPositions") {
            match positions.as_map() {
                Some(positions) => self.load_graph_positions(positions),
                None => tracing::warn!(found = positions.kind(), "ignoring malformed graphPositions"),
            }
        }

        tracing::info!(
            rig = %self.name,
            components = self.components.len(),
            "loaded rig definition"
        );
        Ok(())
    }

    fn load_components(
        &mut self,
        registry: &mut ComponentRegistry,
        profiler: &Profiler,
        entries: &[Value],
    ) -> Result<(), RigError> {
        let _scope = profiler.scope("loadComponents");

        for entry in entries {
            let data = entry
                .as_map()
                .ok_or(DocumentError::NotAMap(entry.kind()))?;
            let class = data.required("class", "string", |v| v.as_str().map(str::to_string))?;
            let factory = registry.resolve(&class)?;
            let name = data.optional_str("name")?;

            let mut component = Component::new(factory(), name);
            component.load_data(data)?;
            self.add_component(component)?;
        }
        Ok(())
    }

    fn make_connections(
        &mut self,
        policy: ConnectionPolicy,
        profiler: &Profiler,
        entries: &[Value],
    ) -> Result<(), RigError> {
        let _scope = profiler.scope("makeConnections");
        let mut connected: HashSet<PortAddress> = HashSet::new();

        for entry in entries {
            let record = ConnectionRecord::from_value(entry)?;
            let fail = |reason: ConnectionFailure| RigError::Connection {
                from: record.source.clone(),
                to: record.target.clone(),
                reason,
            };

            let (source_name, output_name) = split_endpoint(&record.source)
                .ok_or_else(|| fail(ConnectionFailure::MalformedReference(record.source.clone())))?;
            let (target_name, input_name) = split_endpoint(&record.target)
                .ok_or_else(|| fail(ConnectionFailure::MalformedReference(record.target.clone())))?;

            let source = self
                .component_by_decorated_name(source_name)
                .ok_or_else(|| fail(ConnectionFailure::SourceComponentNotFound(source_name.to_string())))?;
            let target = self
                .component_by_decorated_name(target_name)
                .ok_or_else(|| fail(ConnectionFailure::TargetComponentNotFound(target_name.to_string())))?;

            if source.output(output_name).is_none() {
                return Err(fail(ConnectionFailure::OutputNotFound {
                    port: output_name.to_string(),
                    component: source_name.to_string(),
                }));
            }
            let Some(input) = target.input(input_name) else {
                return Err(fail(ConnectionFailure::InputNotFound {
                    port: input_name.to_string(),
                    component: target_name.to_string(),
                }));
            };

            let input_address = input.address();
            if policy == ConnectionPolicy::Strict && !connected.insert(input_address) {
                return Err(fail(ConnectionFailure::InputAlreadyConnected(
                    input_name.to_string(),
                )));
            }

            let (source_id, target_id) = (source.id(), target.id());
            self.connect(source_id, output_name, target_id, input_name, record.target_index)
                .inspect_err(|err| tracing::warn!(connection = %record, "{err}"))?;
            tracing::debug!(connection = %record, index = record.target_index, "connected");
        }
        Ok(())
    }

    fn load_graph_positions(&mut self, positions: &Map) {
        for (decorated_name, position) in positions {
            let Some(id) = self.component_id(decorated_name) else {
                tracing::debug!(component = %decorated_name, "no component for graph position");
                continue;
            };
            match position.as_position() {
                Some(position) => {
                    if let Some(component) = self.components.get_mut(&id) {
                        component.set_graph_position(position);
                    }
                }
                None => tracing::warn!(component = %decorated_name, "ignoring malformed graph position"),
            }
        }
    }

    /// Authoring document: what the guide needs to be reloaded
    pub fn get_data(&self) -> Value {
        self.graph_document(Component::save_data)
    }

    /// Build document: resolved data handed to a builder
    pub fn get_rig_build_data(&self) -> Value {
        self.graph_document(Component::rig_build_data)
    }

    fn graph_document(&self, component_data: impl Fn(&Component) -> Map) -> Value {
        let mut document = Map::new();
        document.insert("name".to_string(), Value::from(self.name.as_str()));

        let components = self
            .components
            .values()
            .map(|c| Value::Map(component_data(c)))
            .collect();
        document.insert("components".to_string(), Value::Array(components));

        let connections = self
            .connection_records()
            .iter()
            .map(ConnectionRecord::to_value)
            .collect();
        let positions: Map = self
            .components
            .values()
            .map(|c| (c.decorated_name(), Value::from(c.graph_position())))
            .collect();
        document.insert("connections".to_string(), Value::Array(connections));
        document.insert("graphPositions".to_string(), Value::Map(positions));

        Value::Map(document)
    }

    // ========================
    // Definition files
    // ========================

    /// Write the guide or build document to `path`; format follows the extension
    pub fn write_definition_file(
        &self,
        ctx: &RigContext,
        path: &Path,
        kind: DefinitionKind,
    ) -> Result<(), RigError> {
        let _scope = ctx
            .profiler
            .scope(format!("writeDefinitionFile:{}", path.display()));

        let document = match kind {
            DefinitionKind::Guide => self.get_data(),
            DefinitionKind::Build => self.get_rig_build_data(),
        };
        let bytes = Format::from_path(path).encode(&document)?;

        let mut file = File::create(path).map_err(|source| RigError::io(path, source))?;
        file.write_all(&bytes)
            .map_err(|source| RigError::io(path, source))?;
        tracing::info!(path = %path.display(), ?kind, "wrote rig definition");
        Ok(())
    }

    /// Read, parse and assemble a definition file
    pub fn load_definition_file(&mut self, ctx: &mut RigContext, path: &Path) -> Result<(), RigError> {
        let scope_name = format!("loadDefinitionFile:{}", path.display());
        ctx.profiler.push(scope_name);
        let result = self.load_definition_file_inner(ctx, path);
        ctx.profiler.pop();
        result
    }

    fn load_definition_file_inner(&mut self, ctx: &mut RigContext, path: &Path) -> Result<(), RigError> {
        if !path.exists() {
            return Err(RigError::NotFound(path.to_path_buf()));
        }
        let bytes = {
            let mut file = File::open(path).map_err(|source| RigError::io(path, source))?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .map_err(|source| RigError::io(path, source))?;
            bytes
        };
        let document = Format::from_path(path).decode(&bytes)?;
        tracing::debug!(path = %path.display(), "parsed rig definition");
        self.load_rig_definition(ctx, &document)
    }
}

impl Default for Rig {
    fn default() -> Self {
        Self::new(DEFAULT_RIG_NAME)
    }
}

fn list_field<'a>(field: &str, value: &'a Value) -> Result<&'a [Value], DocumentError> {
    value.as_array().ok_or_else(|| DocumentError::InvalidField {
        field: field.to_string(),
        expected: "array",
        found: value.kind(),
    })
}

/// Why a connection record could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionFailure {
    /// Reference is not `decoratedName.portName`
    MalformedReference(String),
    /// No component with the source decorated name
    SourceComponentNotFound(String),
    /// No component with the target decorated name
    TargetComponentNotFound(String),
    /// Source component has no such output
    OutputNotFound {
        /// Output name
        port: String,
        /// Source decorated name
        component: String,
    },
    /// Target component has no such input
    InputNotFound {
        /// Input name
        port: String,
        /// Target decorated name
        component: String,
    },
    /// Strict policy: the input was already connected during this load
    InputAlreadyConnected(String),
}

impl fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedReference(r) => write!(f, "Malformed port reference: {r}"),
            Self::SourceComponentNotFound(c) => write!(f, "Source component not found: {c}"),
            Self::TargetComponentNotFound(c) => write!(f, "Target component not found: {c}"),
            Self::OutputNotFound { port, component } => {
                write!(f, "Output '{port}' not found on Component: {component}")
            }
            Self::InputNotFound { port, component } => {
                write!(f, "Input '{port}' not found on Component: {component}")
            }
            Self::InputAlreadyConnected(port) => {
                write!(f, "Input '{port}' is already connected")
            }
        }
    }
}

/// Error from a rig operation
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    /// Port-level connection failure (type mismatch, wrong direction)
    #[error(transparent)]
    Port(#[from] PortError),

    /// Component type could not be resolved
    #[error(transparent)]
    TypeResolution(#[from] TypeResolutionError),

    /// Ill-formed document
    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),

    /// Encoding or parsing failure
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A connection record could not be resolved
    #[error("Error making connection: {from} -> {to}. {reason}")]
    Connection {
        /// Source reference as written
        from: String,
        /// Target reference as written
        to: String,
        /// What went wrong
        reason: ConnectionFailure,
    },

    /// Name, location or port name that cannot appear in a port reference
    #[error("Invalid name '{0}': names must be non-empty and must not contain '.'")]
    InvalidName(String),

    /// Decorated name already used by a sibling
    #[error("Component already exists: {0}")]
    DuplicateComponent(String),

    /// No component with this ID
    #[error("Component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// Component has no such port
    #[error("No {direction} '{port}' on component {component}")]
    PortNotFound {
        /// Component ID
        component: ComponentId,
        /// Port name
        port: String,
        /// Port direction
        direction: PortDirection,
    },

    /// Definition file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File read/write failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl RigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
