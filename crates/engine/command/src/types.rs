//! Parameter and result types of the command catalogue

use crate::value::BackendValue;
use crate::warnings::CommandWarnings;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracklink_transform::wire::Vec3Wire;
use tracklink_transform::ModelTransform;

/// Response of `createTracker`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Generic `{"value": ...}` wrapper used by getters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueResult<T> {
    pub value: T,
}

/// Properties of one model of a model tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProperties {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub occluder: bool,
    #[serde(default)]
    pub use_lines: bool,
}

impl ModelProperties {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            enabled: true,
            occluder: false,
            use_lines: true,
        }
    }

    pub fn occluder(mut self, occluder: bool) -> Self {
        self.occluder = occluder;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Response of `getModelProperties`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelPropertiesList {
    #[serde(default)]
    pub info: Vec<ModelProperties>,
}

/// Layout of one model's geometry inside a binary `addModelData` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinaryDataDescriptor {
    pub binary_offset: u32,
    pub vertex_count: u32,
    pub triangle_index_count: u32,
    pub line_index_count: u32,
    pub normal_count: u32,
    pub color_count: u32,
    pub uv_count: u32,
    pub texture_height: u32,
    pub texture_width: u32,
}

impl BinaryDataDescriptor {
    /// Bytes occupied by the geometry described here.
    ///
    /// Vertices, normals and uvs are f32 vectors, indices are u32, colors
    /// and texture pixels are RGBA8. Saturates instead of overflowing on
    /// corrupt counts.
    pub fn data_size_in_bytes(&self) -> usize {
        let f = std::mem::size_of::<f32>();
        let u = std::mem::size_of::<u32>();
        let index_count =
            (self.triangle_index_count as usize).saturating_add(self.line_index_count as usize);
        let pixels = (self.texture_width as usize).saturating_mul(self.texture_height as usize);
        [
            elements(self.vertex_count as usize, 3 * f),
            elements(index_count, u),
            elements(self.normal_count as usize, 3 * f),
            elements(self.color_count as usize, 4),
            elements(self.uv_count as usize, 2 * f),
            elements(pixels, 4),
        ]
        .into_iter()
        .fold(0, usize::saturating_add)
    }
}

fn elements(count: usize, size: usize) -> usize {
    count.saturating_mul(size)
}

/// A model whose geometry travels in the binary payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDataDescriptor {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub occluder: bool,
    #[serde(default)]
    pub use_lines: bool,
    #[serde(default)]
    pub transform: ModelTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<BinaryDataDescriptor>,
}

impl ModelDataDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            occluder: false,
            use_lines: true,
            transform: ModelTransform::identity(),
            shape: None,
        }
    }

    pub fn with_transform(mut self, transform: ModelTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shape(mut self, shape: BinaryDataDescriptor) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Parameter of `setMultipleModelProperties` and `addModelData`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelDataDescriptorList {
    pub models: Vec<ModelDataDescriptor>,
}

impl ModelDataDescriptorList {
    /// Total binary size the descriptors expect
    pub fn binary_size(&self) -> usize {
        self.models
            .iter()
            .filter_map(|m| m.shape)
            .map(|s| (s.binary_offset as usize).saturating_add(s.data_size_in_bytes()))
            .max()
            .unwrap_or(0)
    }
}

/// One model registered by `addModelData`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddedModel {
    pub name: String,
    pub license_feature: String,
}

/// Response of `addModelData`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelDeserializationResultList {
    pub added_models: Vec<AddedModel>,
    #[serde(flatten)]
    pub warnings: CommandWarnings,
}

/// Parameter of `set1DRotationConstraint`, all vectors in engine space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationConstraint {
    pub up_world: Vec3Wire,
    pub up_model: Vec3Wire,
    pub center_model: Vec3Wire,
}

impl RotationConstraint {
    pub fn new(up_world: Vec3, up_model: Vec3, center_model: Vec3) -> Self {
        Self {
            up_world: up_world.into(),
            up_model: up_model.into(),
            center_model: center_model.into(),
        }
    }
}

/// One per-anchor attribute value of `setAttributeSeparately`/`getAttributeSeparately`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorValue {
    pub anchor: String,
    pub value: Value,
}

impl AnchorValue {
    /// Value in the string form the engine expects for setters
    pub fn new<T: BackendValue>(anchor: impl Into<String>, value: &T) -> Self {
        Self {
            anchor: anchor.into(),
            value: Value::String(value.to_backend_string()),
        }
    }
}

fn default_true() -> bool {
    true
}
