//! Translation, rotation and non-uniform scale

use crate::flip::{FLIP_X, FLIP_XY};
use crate::init_pose::InitPose;
use crate::pose::host_pose_to_engine;
use crate::rotation::quaternion_from_matrix;
use crate::wire::ModelTransformWire;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Any translation component beyond this is treated as "no pose".
const FAR_AWAY: f32 = 100_000.0;

/// A similarity-like transform as exchanged with the engine.
///
/// Serializes to `{"t": {x,y,z}, "s": {x,y,z}, "r": {x,y,z,w}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModelTransformWire", into = "ModelTransformWire")]
pub struct ModelTransform {
    pub t: Vec3,
    pub r: Quat,
    pub s: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ModelTransform {
    pub fn new(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self { t, r, s }
    }

    /// Rigid transform with unit scale.
    pub fn from_pose(t: Vec3, r: Quat) -> Self {
        Self::new(t, r, Vec3::ONE)
    }

    pub fn identity() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    /// Decomposes an affine matrix. Scale is the length of each basis column;
    /// a zero-length column keeps scale 0 and contributes nothing to the
    /// rotation.
    pub fn from_matrix(m: Mat4) -> Self {
        let s = Vec3::new(
            m.x_axis.truncate().length(),
            m.y_axis.truncate().length(),
            m.z_axis.truncate().length(),
        );

        let mut unscaled = m;
        for (col, scale) in [s.x, s.y, s.z].into_iter().enumerate() {
            if scale > 0.0 {
                *unscaled.col_mut(col) /= scale;
            }
        }

        Self {
            t: m.w_axis.truncate(),
            r: quaternion_from_matrix(&unscaled).normalize(),
            s,
        }
    }

    /// Converts an engine init pose into a transform in engine model space.
    pub fn from_init_pose(pose: &InitPose) -> Self {
        FLIP_XY * Self::from_pose(pose.translation(), pose.rotation())
    }

    /// Converts a host transform into engine convention by mirroring X.
    pub fn host_to_engine(&self) -> Self {
        let (t, r) = host_pose_to_engine(self.t, self.r);
        Self { t, r, s: self.s }
    }

    /// Mirrors X on both sides of the matrix. Self-inverse.
    pub fn flip_handedness(&self) -> Self {
        Self::from_matrix(FLIP_X * self.to_matrix() * FLIP_X)
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.s, self.r, self.t)
    }

    pub fn inverse(&self) -> Self {
        Self::from_matrix(self.to_matrix().inverse())
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.to_matrix().transform_point3(point)
    }

    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.to_matrix().transform_vector3(direction)
    }

    /// Rotates the transform by `rotation` about `center` instead of the
    /// origin.
    pub fn rotate_around_center(&self, center: Vec3, rotation: Quat) -> Self {
        let around_center =
            Self::from_pose(center, rotation) * Self::from_pose(-center, Quat::IDENTITY);
        around_center * *self
    }

    /// Compares translation distance and the angle of the relative rotation.
    /// Angles are in degrees.
    pub fn is_similar_to(&self, other: &Self, max_angle: f32, max_translation: f32) -> bool {
        let delta_translation = (self.t - other.t).length();
        let (_, delta_angle) = (self.r * other.r.inverse()).to_axis_angle();
        let delta_angle = delta_angle.to_degrees();

        delta_translation < max_translation
            && (delta_angle < max_angle || delta_angle > 360.0 - max_angle)
    }

    /// `is_similar_to` with 0.1 degrees and 0.01 units.
    pub fn is_close_to(&self, other: &Self) -> bool {
        self.is_similar_to(other, 0.1, 0.01)
    }

    /// The engine reports lost poses with huge translations.
    pub fn is_far_away(&self) -> bool {
        self.t.abs().max_element() > FAR_AWAY
    }
}

impl Mul for ModelTransform {
    type Output = ModelTransform;

    fn mul(self, rhs: ModelTransform) -> ModelTransform {
        self.to_matrix() * rhs
    }
}

impl Mul<ModelTransform> for Mat4 {
    type Output = ModelTransform;

    fn mul(self, rhs: ModelTransform) -> ModelTransform {
        ModelTransform::from_matrix(self * rhs.to_matrix())
    }
}

impl Mul<Mat4> for ModelTransform {
    type Output = ModelTransform;

    fn mul(self, rhs: Mat4) -> ModelTransform {
        ModelTransform::from_matrix(self.to_matrix() * rhs)
    }
}
