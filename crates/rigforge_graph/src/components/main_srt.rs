// SPDX-License-Identifier: MIT OR Apache-2.0
//! Main SRT (scale/rotate/translate) root component.
//!
//! The guide places the rig root and sizes its control. Building bakes the
//! nested offset control from those two values.

use crate::component::ComponentKind;
use crate::document::{DocumentError, Map, MapExt, Value};
use crate::math::Xfo;
use crate::port::{DataType, PortSpec};
use crate::registry::ComponentRegistry;

/// Offset control size relative to the main control
pub const OFFSET_SIZE_RATIO: f64 = 0.9;

const DEFAULT_SIZE: f64 = 3.0;

fn outputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("mainSrt", DataType::Xfo),
        PortSpec::new("offsetSrt", DataType::Xfo),
    ]
}

fn read_size(data: &Map, field: &str) -> Result<Option<f64>, DocumentError> {
    let size = data.optional(field, "float", Value::as_f64)?;
    match size {
        Some(s) if s <= 0.0 => Err(DocumentError::InvalidField {
            field: field.to_string(),
            expected: "positive float",
            found: "non-positive float",
        }),
        other => Ok(other),
    }
}

/// Authoring side of the main SRT
#[derive(Debug, Clone)]
pub struct MainSrtComponentGuide {
    /// Placement of the rig root
    pub main_srt_xfo: Xfo,
    /// Control size
    pub main_srt_size: f64,
}

impl MainSrtComponentGuide {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "rigforge.components.main_srt.MainSrtComponentGuide";
}

impl Default for MainSrtComponentGuide {
    fn default() -> Self {
        Self {
            main_srt_xfo: Xfo::IDENTITY,
            main_srt_size: DEFAULT_SIZE,
        }
    }
}

impl ComponentKind for MainSrtComponentGuide {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn build_type_name(&self) -> &str {
        MainSrtComponentRig::TYPE_NAME
    }

    fn default_name(&self) -> &str {
        "mainSrt"
    }

    fn default_outputs(&self) -> Vec<PortSpec> {
        outputs()
    }

    fn load_params(&mut self, data: &Map) -> Result<(), DocumentError> {
        if let Some(xfo) = data.optional("mainSrtXfo", "Xfo", Value::as_xfo)? {
            self.main_srt_xfo = xfo;
        }
        if let Some(size) = read_size(data, "mainSrtSize")? {
            self.main_srt_size = size;
        }
        Ok(())
    }

    fn save_params(&self, data: &mut Map) {
        data.insert("mainSrtXfo".to_string(), Value::Xfo(self.main_srt_xfo));
        data.insert("mainSrtSize".to_string(), Value::Float(self.main_srt_size));
    }

    fn build_params(&self, data: &mut Map) {
        self.save_params(data);
        data.insert("offsetSrtXfo".to_string(), Value::Xfo(self.main_srt_xfo));
        data.insert(
            "offsetSrtSize".to_string(),
            Value::Float(self.main_srt_size * OFFSET_SIZE_RATIO),
        );
    }
}

/// Build side of the main SRT
#[derive(Debug, Clone)]
pub struct MainSrtComponentRig {
    /// Placement of the main control
    pub main_srt_xfo: Xfo,
    /// Main control size
    pub main_srt_size: f64,
    /// Placement of the offset control
    pub offset_srt_xfo: Xfo,
    /// Offset control size
    pub offset_srt_size: f64,
}

impl MainSrtComponentRig {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "rigforge.components.main_srt.MainSrtComponentRig";
}

impl Default for MainSrtComponentRig {
    fn default() -> Self {
        Self {
            main_srt_xfo: Xfo::IDENTITY,
            main_srt_size: DEFAULT_SIZE,
            offset_srt_xfo: Xfo::IDENTITY,
            offset_srt_size: DEFAULT_SIZE * OFFSET_SIZE_RATIO,
        }
    }
}

impl ComponentKind for MainSrtComponentRig {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn default_name(&self) -> &str {
        "mainSrt"
    }

    fn default_outputs(&self) -> Vec<PortSpec> {
        outputs()
    }

    fn load_params(&mut self, data: &Map) -> Result<(), DocumentError> {
        self.main_srt_xfo = data.required("mainSrtXfo", "Xfo", Value::as_xfo)?;
        self.main_srt_size = read_size(data, "mainSrtSize")?
            .ok_or_else(|| DocumentError::MissingField("mainSrtSize".to_string()))?;
        self.offset_srt_xfo = data
            .optional("offsetSrtXfo", "Xfo", Value::as_xfo)?
            .unwrap_or(self.main_srt_xfo);
        self.offset_srt_size = read_size(data, "offsetSrtSize")?
            .unwrap_or(self.main_srt_size * OFFSET_SIZE_RATIO);
        Ok(())
    }

    fn save_params(&self, data: &mut Map) {
        data.insert("mainSrtXfo".to_string(), Value::Xfo(self.main_srt_xfo));
        data.insert("mainSrtSize".to_string(), Value::Float(self.main_srt_size));
        data.insert("offsetSrtXfo".to_string(), Value::Xfo(self.offset_srt_xfo));
        data.insert("offsetSrtSize".to_string(), Value::Float(self.offset_srt_size));
    }
}

fn create_guide() -> Box<dyn ComponentKind> {
    Box::new(MainSrtComponentGuide::default())
}

fn create_rig() -> Box<dyn ComponentKind> {
    Box::new(MainSrtComponentRig::default())
}

pub(crate) fn register(registry: &mut ComponentRegistry) {
    registry.register(MainSrtComponentGuide::TYPE_NAME, create_guide);
    registry.register(MainSrtComponentRig::TYPE_NAME, create_rig);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::math::Vec3;

    fn guide_data() -> Map {
        let mut data = Map::new();
        data.insert("name".to_string(), Value::from("mainSrt"));
        data.insert("location".to_string(), Value::from("M"));
        data.insert(
            "mainSrtXfo".to_string(),
            Value::Xfo(Xfo::from_translation(Vec3::new(0.0, 0.0, 0.0))),
        );
        data.insert("mainSrtSize".to_string(), Value::Float(3.0));
        data
    }

    #[test]
    fn test_guide_build_data() {
        let mut guide = Component::new(Box::new(MainSrtComponentGuide::default()), None);
        guide.load_data(&guide_data()).unwrap();

        let build = guide.rig_build_data();
        assert_eq!(
            build.get("class").and_then(Value::as_str),
            Some(MainSrtComponentRig::TYPE_NAME)
        );
        let offset_size = build.get("offsetSrtSize").and_then(Value::as_f64).unwrap();
        assert!((offset_size - 2.7).abs() < 1e-9);

        let saved = guide.save_data();
        assert_eq!(
            saved.get("class").and_then(Value::as_str),
            Some(MainSrtComponentGuide::TYPE_NAME)
        );
        assert!(saved.get("offsetSrtSize").is_none());
    }

    #[test]
    fn test_rig_loads_guide_build_data() {
        let mut guide = Component::new(Box::new(MainSrtComponentGuide::default()), None);
        guide.load_data(&guide_data()).unwrap();

        let mut rig = Component::new(Box::new(MainSrtComponentRig::default()), None);
        rig.load_data(&guide.rig_build_data()).unwrap();
        assert_eq!(rig.decorated_name(), "mainSrt_M");
        assert_eq!(rig.save_data().get("offsetSrtSize"), guide.rig_build_data().get("offsetSrtSize"));
    }

    #[test]
    fn test_rig_requires_main_xfo() {
        let mut rig = MainSrtComponentRig::default();
        let err = rig.load_params(&Map::new()).unwrap_err();
        assert_eq!(err, DocumentError::MissingField("mainSrtXfo".to_string()));
    }

    #[test]
    fn test_negative_size_rejected() {
        let mut data = guide_data();
        data.insert("mainSrtSize".to_string(), Value::Float(-1.0));
        let mut guide = MainSrtComponentGuide::default();
        assert!(matches!(
            guide.load_params(&data),
            Err(DocumentError::InvalidField { .. })
        ));
    }
}
