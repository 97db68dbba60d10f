// SPDX-License-Identifier: MIT OR Apache-2.0
//! Forward-kinematics chain: a run of equal-length bones along the root's X axis.

use crate::component::ComponentKind;
use crate::document::{DocumentError, Map, MapExt, Value};
use crate::math::Xfo;
use crate::port::{DataType, PortSpec};
use crate::registry::ComponentRegistry;

/// Upper bound on `numBones`
pub const MAX_BONES: usize = 256;

fn inputs() -> Vec<PortSpec> {
    vec![PortSpec::new("parentXfo", DataType::Xfo)]
}

fn outputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("baseXfo", DataType::Xfo),
        PortSpec::new("tipXfo", DataType::Xfo),
    ]
}

fn read_xfo_list(data: &Map, field: &str) -> Result<Vec<Xfo>, DocumentError> {
    let invalid = |found: &'static str| DocumentError::InvalidField {
        field: field.to_string(),
        expected: "array of Xfo",
        found,
    };
    let items = data.require(field)?;
    let items = items.as_array().ok_or_else(|| invalid(items.kind()))?;
    items
        .iter()
        .map(|item| item.as_xfo().ok_or_else(|| invalid(item.kind())))
        .collect()
}

fn read_float_list(data: &Map, field: &str) -> Result<Vec<f64>, DocumentError> {
    let invalid = |found: &'static str| DocumentError::InvalidField {
        field: field.to_string(),
        expected: "array of float",
        found,
    };
    let items = data.require(field)?;
    let items = items.as_array().ok_or_else(|| invalid(items.kind()))?;
    items
        .iter()
        .map(|item| item.as_f64().ok_or_else(|| invalid(item.kind())))
        .collect()
}

/// Authoring side of an FK chain
#[derive(Debug, Clone)]
pub struct FkChainComponentGuide {
    /// Placement of the first bone
    pub root_xfo: Xfo,
    /// Length of each bone
    pub bone_length: f64,
    /// Number of bones
    pub num_bones: usize,
}

impl FkChainComponentGuide {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "rigforge.components.fk_chain.FkChainComponentGuide";

    /// Bone transforms: each bone starts where the previous one ends
    pub fn bone_xfos(&self) -> Vec<Xfo> {
        (0..self.num_bones)
            .map(|i| self.root_xfo.offset_along_x(self.bone_length * i as f64))
            .collect()
    }

    /// Transform at the end of the last bone
    pub fn tip_xfo(&self) -> Xfo {
        self.root_xfo
            .offset_along_x(self.bone_length * self.num_bones as f64)
    }
}

impl Default for FkChainComponentGuide {
    fn default() -> Self {
        Self {
            root_xfo: Xfo::IDENTITY,
            bone_length: 1.0,
            num_bones: 3,
        }
    }
}

impl ComponentKind for FkChainComponentGuide {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn build_type_name(&self) -> &str {
        FkChainComponentRig::TYPE_NAME
    }

    fn default_name(&self) -> &str {
        "fkChain"
    }

    fn default_inputs(&self) -> Vec<PortSpec> {
        inputs()
    }

    fn default_outputs(&self) -> Vec<PortSpec> {
        outputs()
    }

    fn load_params(&mut self, data: &Map) -> Result<(), DocumentError> {
        if let Some(xfo) = data.optional("rootXfo", "Xfo", Value::as_xfo)? {
            self.root_xfo = xfo;
        }
        if let Some(length) =
            data.optional("boneLength", "positive float", |v| v.as_f64().filter(|l| *l > 0.0))?
        {
            self.bone_length = length;
        }
        if let Some(count) = data.optional("numBones", "integer from 1 to 256", |v| {
            v.as_i64()
                .and_then(|n| usize::try_from(n).ok())
                .filter(|n| (1..=MAX_BONES).contains(n))
        })? {
            self.num_bones = count;
        }
        Ok(())
    }

    fn save_params(&self, data: &mut Map) {
        data.insert("rootXfo".to_string(), Value::Xfo(self.root_xfo));
        data.insert("boneLength".to_string(), Value::Float(self.bone_length));
        data.insert("numBones".to_string(), Value::from(self.num_bones));
    }

    fn build_params(&self, data: &mut Map) {
        data.insert(
            "boneXfos".to_string(),
            Value::Array(self.bone_xfos().into_iter().map(Value::Xfo).collect()),
        );
        data.insert(
            "boneLengths".to_string(),
            Value::Array(vec![Value::Float(self.bone_length); self.num_bones]),
        );
        data.insert("tipXfo".to_string(), Value::Xfo(self.tip_xfo()));
    }
}

/// Build side of an FK chain
#[derive(Debug, Clone, Default)]
pub struct FkChainComponentRig {
    /// One transform per bone
    pub bone_xfos: Vec<Xfo>,
    /// One length per bone
    pub bone_lengths: Vec<f64>,
    /// End of the chain
    pub tip_xfo: Xfo,
}

impl FkChainComponentRig {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "rigforge.components.fk_chain.FkChainComponentRig";
}

impl ComponentKind for FkChainComponentRig {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn default_name(&self) -> &str {
        "fkChain"
    }

    fn default_inputs(&self) -> Vec<PortSpec> {
        inputs()
    }

    fn default_outputs(&self) -> Vec<PortSpec> {
        outputs()
    }

    fn load_params(&mut self, data: &Map) -> Result<(), DocumentError> {
        let bone_xfos = read_xfo_list(data, "boneXfos")?;
        let bone_lengths = read_float_list(data, "boneLengths")?;
        if bone_xfos.len() != bone_lengths.len() {
            return Err(DocumentError::InvalidField {
                field: "boneLengths".to_string(),
                expected: "one length per bone",
                found: "mismatched array",
            });
        }
        self.tip_xfo = data.required("tipXfo", "Xfo", Value::as_xfo)?;
        self.bone_xfos = bone_xfos;
        self.bone_lengths = bone_lengths;
        Ok(())
    }

    fn save_params(&self, data: &mut Map) {
        data.insert(
            "boneXfos".to_string(),
            Value::Array(self.bone_xfos.iter().copied().map(Value::Xfo).collect()),
        );
        data.insert(
            "boneLengths".to_string(),
            Value::Array(self.bone_lengths.iter().copied().map(Value::Float).collect()),
        );
        data.insert("tipXfo".to_string(), Value::Xfo(self.tip_xfo));
    }
}

fn create_guide() -> Box<dyn ComponentKind> {
    Box::new(FkChainComponentGuide::default())
}

fn create_rig() -> Box<dyn ComponentKind> {
    Box::new(FkChainComponentRig::default())
}

pub(crate) fn register(registry: &mut ComponentRegistry) {
    registry.register(FkChainComponentGuide::TYPE_NAME, create_guide);
    registry.register(FkChainComponentRig::TYPE_NAME, create_rig);
}
