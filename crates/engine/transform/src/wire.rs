//! JSON shapes used by the engine for vectors, quaternions and transforms
//!
//! `glam` serializes vectors as arrays; the engine expects named components.

use crate::model_transform::ModelTransform;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3Wire {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuatWire {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for QuatWire {
    fn default() -> Self {
        Quat::IDENTITY.into()
    }
}

/// `{"t": {..}, "s": {..}, "r": {..}}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransformWire {
    pub t: Vec3Wire,
    #[serde(default = "unit_scale")]
    pub s: Vec3Wire,
    pub r: QuatWire,
}

fn unit_scale() -> Vec3Wire {
    Vec3::ONE.into()
}

impl From<Vec3> for Vec3Wire {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Wire> for Vec3 {
    fn from(v: Vec3Wire) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Quat> for QuatWire {
    fn from(q: Quat) -> Self {
        Self { x: q.x, y: q.y, z: q.z, w: q.w }
    }
}

impl From<QuatWire> for Quat {
    fn from(q: QuatWire) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

impl From<ModelTransform> for ModelTransformWire {
    fn from(mt: ModelTransform) -> Self {
        Self {
            t: mt.t.into(),
            s: mt.s.into(),
            r: mt.r.into(),
        }
    }
}

impl From<ModelTransformWire> for ModelTransform {
    fn from(wire: ModelTransformWire) -> Self {
        ModelTransform::new(wire.t.into(), wire.r.into(), wire.s.into())
    }
}
