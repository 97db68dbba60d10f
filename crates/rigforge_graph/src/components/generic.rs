// SPDX-License-Identifier: MIT OR Apache-2.0
//! Free-form component whose ports and parameters come from its document.

use crate::component::ComponentKind;
use crate::document::{DocumentError, Map};
use crate::registry::ComponentRegistry;

/// Keys handled by [`crate::Component`] itself
const RESERVED_KEYS: [&str; 5] = ["class", "name", "location", "inputs", "outputs"];

/// Component that keeps every non-reserved document field as a parameter
#[derive(Debug, Clone, Default)]
pub struct GenericComponent {
    params: Map,
}

impl GenericComponent {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "rigforge.components.generic.GenericComponent";

    /// Stored parameters
    pub fn params(&self) -> &Map {
        &self.params
    }
}

impl ComponentKind for GenericComponent {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn default_name(&self) -> &str {
        "component"
    }

    fn load_params(&mut self, data: &Map) -> Result<(), DocumentError> {
        self.params = data
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(())
    }

    fn save_params(&self, data: &mut Map) {
        data.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

fn create() -> Box<dyn ComponentKind> {
    Box::new(GenericComponent::default())
}

pub(crate) fn register(registry: &mut ComponentRegistry) {
    registry.register(GenericComponent::TYPE_NAME, create);
}
