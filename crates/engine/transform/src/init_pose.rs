//! The seed pose handed to the engine before tracking converges

use crate::flip::{FLIP_X, FLIP_Y};
use crate::model_transform::ModelTransform;
use crate::pose::world_to_engine_pose;
use crate::render_rotation::RenderRotation;
use crate::rotation::look_rotation;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Engine-space pose in the `{"t": [x, y, z], "r": [x, y, z, w]}` wire shape
/// of `getInitPose` and `setInitPose`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitPose {
    pub t: [f32; 3],
    pub r: [f32; 4],
}

impl Default for InitPose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl InitPose {
    pub fn new(t: Vec3, r: Quat) -> Self {
        Self {
            t: t.to_array(),
            r: r.to_array(),
        }
    }

    pub fn from_model_transform(mt: &ModelTransform) -> Self {
        Self::new(mt.t, mt.r)
    }

    /// Init pose for a host camera, given its view matrix and the current
    /// screen rotation.
    pub fn from_camera(world_to_camera: Mat4, rotation: RenderRotation) -> Self {
        let (t, r) = world_to_engine_pose(rotation.matrix_host_to_engine() * world_to_camera);
        Self::new(t, r)
    }

    /// Right-handed global pose of an object, given its host local-to-world
    /// matrix. Used with `setGlobalObjectPose`.
    pub fn global_object_pose(object_to_world: Mat4) -> Self {
        let m = FLIP_Y * object_to_world * FLIP_X;
        let r = look_rotation(m.z_axis.truncate(), m.y_axis.truncate());
        Self::new(m.w_axis.truncate(), r)
    }

    /// Pose of an object relative to its anchor, from a host matrix. Used with
    /// `setRelativeInitPose`.
    pub fn relative_init_pose(relative: Mat4) -> Self {
        Self::from_model_transform(&ModelTransform::from_matrix(FLIP_X * relative * FLIP_X))
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::from_array(self.t)
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_array(self.r)
    }
}

impl From<ModelTransform> for InitPose {
    fn from(mt: ModelTransform) -> Self {
        Self::from_model_transform(&mt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{engine_to_world_pose, world_to_camera_matrix};
    use crate::rotation::same_rotation;

    #[test]
    fn test_wire_shape() {
        let pose = InitPose::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let json = serde_json::to_string(&pose).unwrap();
        assert_eq!(json, r#"{"t":[1.0,2.0,3.0],"r":[0.0,0.0,0.0,1.0]}"#);

        let back: InitPose = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pose);
    }

    #[test]
    fn test_from_camera_unrotated() {
        let position = Vec3::new(0.2, 1.0, -3.0);
        let orientation = Quat::from_rotation_y(0.25);
        let pose = InitPose::from_camera(
            world_to_camera_matrix(position, orientation),
            RenderRotation::Ccw0,
        );

        let (p, q) = engine_to_world_pose(pose.translation(), pose.rotation());
        assert!((p - position).length() < 1e-5);
        assert!(same_rotation(q, orientation, 1e-5));
    }

    #[test]
    fn test_from_camera_rotated_screen() {
        let wtc = world_to_camera_matrix(Vec3::new(0.0, 0.0, -2.0), Quat::IDENTITY);
        let upright = InitPose::from_camera(wtc, RenderRotation::Ccw0);
        let rotated = InitPose::from_camera(wtc, RenderRotation::Ccw90);

        // Screen rotation turns the camera about its optical axis only
        assert!((upright.translation() - rotated.translation()).length() < 1e-5);
        let delta = rotated.rotation() * upright.rotation().inverse();
        assert!(same_rotation(delta, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1e-5));
    }

    #[test]
    fn test_global_object_pose_identity() {
        let pose = InitPose::global_object_pose(Mat4::IDENTITY);
        assert_eq!(pose.translation(), Vec3::ZERO);
        // FLIP_Y * FLIP_X is a half-turn about Z
        assert!(same_rotation(pose.rotation(), Quat::from_xyzw(0.0, 0.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_relative_init_pose_mirrors_x() {
        let host =
            Mat4::from_rotation_translation(Quat::from_rotation_y(0.5), Vec3::new(1.0, 2.0, 3.0));
        let pose = InitPose::relative_init_pose(host);

        assert!((pose.translation() - Vec3::new(-1.0, 2.0, 3.0)).length() < 1e-5);
        assert!(same_rotation(pose.rotation(), Quat::from_rotation_y(-0.5), 1e-5));
    }

    #[test]
    fn test_model_transform_from_init_pose() {
        let pose = InitPose::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let mt = ModelTransform::from_init_pose(&pose);
        assert!((mt.t - Vec3::new(-1.0, -2.0, 3.0)).length() < 1e-6);
        assert!(same_rotation(mt.r, Quat::from_rotation_z(std::f32::consts::PI), 1e-6));
    }
}
