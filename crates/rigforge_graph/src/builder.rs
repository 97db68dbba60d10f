// SPDX-License-Identifier: MIT OR Apache-2.0
//! Seam between the rig model and whatever materializes a built rig.

use crate::connection::ConnectionRecord;
use crate::document::Value;
use crate::rig::{Rig, RigContext, RigError};
use std::fmt;

/// Consumes a build document and produces a concrete rig
pub trait Builder {
    /// Build from the output of [`Rig::get_rig_build_data`]
    fn build(&mut self, build_data: &Value) -> Result<BuildReport, BuilderError>;
}

/// A component as seen by a builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltComponent {
    /// Decorated name
    pub name: String,
    /// Build class
    pub class: String,
}

/// Summary of a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Rig name
    pub rig_name: String,
    /// Components in build order
    pub components: Vec<BuiltComponent>,
    /// Connections between them
    pub connections: Vec<ConnectionRecord>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} components, {} connections",
            self.rig_name,
            self.components.len(),
            self.connections.len()
        )?;
        for component in &self.components {
            writeln!(f, "  {} ({})", component.name, component.class)?;
        }
        for connection in &self.connections {
            writeln!(f, "  {connection}")?;
        }
        Ok(())
    }
}

/// Builder that assembles the build document and logs what a backend would create
#[derive(Debug, Default)]
pub struct TraceBuilder {
    ctx: RigContext,
}

impl TraceBuilder {
    /// Create a builder resolving classes through `ctx`
    pub fn new(ctx: RigContext) -> Self {
        Self { ctx }
    }

    /// Give the context back
    pub fn into_context(self) -> RigContext {
        self.ctx
    }
}

impl Builder for TraceBuilder {
    fn build(&mut self, build_data: &Value) -> Result<BuildReport, BuilderError> {
        let mut rig = Rig::default();
        rig.load_rig_definition(&mut self.ctx, build_data)?;

        let _scope = self.ctx.profiler.scope(format!("build:{}", rig.name()));
        let mut report = BuildReport {
            rig_name: rig.name().to_string(),
            ..BuildReport::default()
        };

        for component in rig.components() {
            let kind = component.kind();
            if kind.build_type_name() != kind.type_name() {
                return Err(BuilderError::GuideComponent {
                    component: component.decorated_name(),
                    class: kind.type_name().to_string(),
                });
            }
            tracing::info!(
                component = %component.decorated_name(),
                class = kind.type_name(),
                inputs = component.num_inputs(),
                outputs = component.num_outputs(),
                "build component"
            );
            report.components.push(BuiltComponent {
                name: component.decorated_name(),
                class: kind.type_name().to_string(),
            });
        }

        for record in rig.connection_records() {
            tracing::info!(connection = %record, index = record.target_index, "build connection");
            report.connections.push(record);
        }

        Ok(report)
    }
}

/// Error from a builder
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// The build document could not be assembled
    #[error(transparent)]
    Rig(#[from] RigError),

    /// A guide class appeared where build data was expected
    #[error("Component '{component}' has guide class {class}; pass build data to the builder")]
    GuideComponent {
        /// Decorated name
        component: String,
        /// Offending class
        class: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::components::fk_chain::FkChainComponentGuide;
    use crate::components::main_srt::{MainSrtComponentGuide, MainSrtComponentRig};

    fn guide_rig() -> Rig {
        let mut rig = Rig::new("hero");
        let main = rig
            .add_component(
                Component::new(Box::new(MainSrtComponentGuide::default()), None).with_location("M"),
            )
            .unwrap();
        let chain = rig
            .add_component(
                Component::new(Box::new(FkChainComponentGuide::default()), Some("spine"))
                    .with_location("M"),
            )
            .unwrap();
        rig.connect(main, "offsetSrt", chain, "parentXfo", 0).unwrap();
        rig
    }

    #[test]
    fn test_trace_build() {
        let rig = guide_rig();
        let mut builder = TraceBuilder::default();
        let report = builder.build(&rig.get_rig_build_data()).unwrap();

        assert_eq!(report.rig_name, "hero");
        assert_eq!(
            report.components[0],
            BuiltComponent {
                name: "mainSrt_M".to_string(),
                class: MainSrtComponentRig::TYPE_NAME.to_string(),
            }
        );
        assert_eq!(report.connections.len(), 1);
        assert_eq!(report.connections[0].to_string(), "mainSrt_M.offsetSrt -> spine_M.parentXfo");

        let text = report.to_string();
        assert!(text.starts_with("hero: 2 components, 1 connections\n"));
    }

    #[test]
    fn test_guide_data_rejected() {
        let rig = guide_rig();
        let mut builder = TraceBuilder::default();
        let err = builder.build(&rig.get_data()).unwrap_err();
        assert!(matches!(err, BuilderError::GuideComponent { ref component, .. } if component == "mainSrt_M"));
    }
}
