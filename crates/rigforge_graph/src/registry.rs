// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of constructible component types.
//!
//! Type identifiers are dotted paths: everything before the last `.` names the
//! owning module, the last segment names the type. Modules are registration
//! functions that run the first time one of their types is resolved.

use crate::component::{Component, ComponentKind};
use indexmap::IndexMap;

/// Constructor for a component kind
pub type ComponentFactory = fn() -> Box<dyn ComponentKind>;

/// Registration function for a module of component types
pub type ModuleInit = fn(&mut ComponentRegistry);

#[derive(Debug, Clone, Copy)]
struct ModuleEntry {
    init: ModuleInit,
    loaded: bool,
}

/// Registry of available component types
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Registered factories by fully-qualified type name
    types: IndexMap<String, ComponentFactory>,
    /// Known modules by path
    modules: IndexMap<String, ModuleEntry>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that knows the built-in component modules
    pub fn with_standard_components() -> Self {
        let mut registry = Self::new();
        crate::components::register_standard_modules(&mut registry);
        registry
    }

    /// Register a component type
    pub fn register(&mut self, type_name: impl Into<String>, factory: ComponentFactory) {
        let type_name = type_name.into();
        tracing::trace!(type_name = %type_name, "registered component type");
        self.types.insert(type_name, factory);
    }

    /// Register a module whose `init` runs on first use
    pub fn register_module(&mut self, path: impl Into<String>, init: ModuleInit) {
        self.modules
            .entry(path.into())
            .or_insert(ModuleEntry { init, loaded: false });
    }

    /// Whether a module's registration function has run
    pub fn is_module_loaded(&self, path: &str) -> bool {
        self.modules.get(path).is_some_and(|m| m.loaded)
    }

    /// Run a module's registration function if it has not run yet.
    ///
    /// Returns `false` if no such module is registered.
    pub fn load_module(&mut self, path: &str) -> bool {
        let Some(entry) = self.modules.get_mut(path) else {
            return false;
        };
        if entry.loaded {
            return true;
        }
        entry.loaded = true;
        let init = entry.init;
        tracing::debug!(module = path, "loading component module");
        init(self);
        true
    }

    /// Resolve a fully-qualified type name to its factory, loading its module on demand
    pub fn resolve(&mut self, type_name: &str) -> Result<ComponentFactory, TypeResolutionError> {
        let (module, _) = split_type_name(type_name);
        let module_known = module.is_empty() || self.load_module(module);

        if let Some(factory) = self.types.get(type_name) {
            return Ok(*factory);
        }
        if module_known {
            Err(TypeResolutionError::UnknownType(type_name.to_string()))
        } else {
            Err(TypeResolutionError::UnknownModule {
                module: module.to_string(),
                type_name: type_name.to_string(),
            })
        }
    }

    /// Construct a component from a type name
    pub fn create(
        &mut self,
        type_name: &str,
        name: Option<&str>,
    ) -> Result<Component, TypeResolutionError> {
        let factory = self.resolve(type_name)?;
        Ok(Component::new(factory(), name))
    }
}

/// Split `a.b.Type` into (`a.b`, `Type`); a bare name has an empty module
pub fn split_type_name(type_name: &str) -> (&str, &str) {
    type_name.rsplit_once('.').unwrap_or(("", type_name))
}

/// Error resolving a component type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeResolutionError {
    /// No module is registered under the type's path
    #[error("Module '{module}' not found while resolving component type '{type_name}'")]
    UnknownModule {
        /// Module path
        module: String,
        /// Full type name
        type_name: String,
    },

    /// The module is known but does not provide the type
    #[error("Component type not found: {0}")]
    UnknownType(String),
}
