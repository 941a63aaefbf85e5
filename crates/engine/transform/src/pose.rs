//! Camera and object pose conversions between host space and engine space
//!
//! Host space is left-handed with Y up; a host camera looks along its local +Z
//! and its view matrix follows the OpenGL convention (camera looks along -Z).
//! Engine space is right-handed; an engine camera pose maps world points into
//! a camera frame with x right, y down and z pointing into the scene.

use crate::flip::{FLIP_YZ, FLIP_Z, ROTATION_Y180};
use crate::rotation::{look_rotation, quaternion_from_matrix};
use glam::{Mat4, Quat, Vec3};

/// Half-turn about the vertical axis as a quaternion.
const HALF_TURN_Y: Quat = Quat::from_xyzw(0.0, 1.0, 0.0, 0.0);

/// Builds the host view matrix of a camera placed at `position` with
/// `orientation`.
pub fn world_to_camera_matrix(position: Vec3, orientation: Quat) -> Mat4 {
    FLIP_Z * Mat4::from_rotation_translation(orientation, position).inverse()
}

/// Converts a host world-to-camera matrix into an engine camera pose.
///
/// Returns the translation and rotation of the engine model-view transform.
pub fn world_to_engine_pose(world_to_camera: Mat4) -> (Vec3, Quat) {
    let mut m = world_to_camera * ROTATION_Y180;

    // Left-handed to right-handed model-view
    let z_axis = m.col_mut(2);
    z_axis.x = -z_axis.x;
    z_axis.y = -z_axis.y;
    z_axis.z = -z_axis.z;

    // OpenGL camera axes to engine camera axes
    let m = FLIP_YZ * m;

    (m.w_axis.truncate(), quaternion_from_matrix(&m))
}

/// Converts an engine camera pose back into a host camera position and
/// orientation. Inverse of [`world_to_engine_pose`].
pub fn engine_to_world_pose(t: Vec3, r: Quat) -> (Vec3, Quat) {
    let r = r * HALF_TURN_Y;

    let mut position = -(r.conjugate() * t);
    position.z = -position.z;

    // Half-turn about X takes engine camera axes to right-handed GL axes,
    // negating x and z then mirrors the rotation into the left-handed frame.
    let mirrored = Quat::from_xyzw(-r.w, r.z, r.y, -r.x);

    // Rotation of the camera in the world, not of the world around the camera
    (position, mirrored.conjugate())
}

/// Converts an engine model-view matrix (OpenGL camera axes) into a host
/// camera position and orientation.
///
/// `render_rotation_to_host` undoes the screen rotation the host applies to
/// the scene; pass `Mat4::IDENTITY` when the display is not rotated.
pub fn model_view_to_world_pose(model_view: Mat4, render_rotation_to_host: Mat4) -> (Vec3, Quat) {
    let world_to_camera = render_rotation_to_host * model_view * ROTATION_Y180;
    let world_to_camera = FLIP_Z * world_to_camera * FLIP_Z;
    let camera_to_world = world_to_camera.inverse();

    let rotation = look_rotation(
        camera_to_world.z_axis.truncate(),
        camera_to_world.y_axis.truncate(),
    );
    (camera_to_world.w_axis.truncate(), rotation)
}

/// Converts a host position and rotation into engine convention.
pub fn host_pose_to_engine(position: Vec3, rotation: Quat) -> (Vec3, Quat) {
    (
        Vec3::new(-position.x, position.y, position.z),
        Quat::from_xyzw(rotation.x, -rotation.y, -rotation.z, rotation.w),
    )
}

/// In-place form of [`host_pose_to_engine`].
pub fn host_to_engine_in_place(position: &mut Vec3, rotation: &mut Quat) {
    (*position, *rotation) = host_pose_to_engine(*position, *rotation);
}

/// Converts a host direction or point into engine convention.
pub fn host_vector_to_engine(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

/// Converts an engine position into host convention.
pub fn engine_position_to_host(t: Vec3) -> Vec3 {
    Vec3::new(-t.x, t.y, t.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::same_rotation;

    #[test]
    fn test_identity_camera() {
        let (t, r) = world_to_engine_pose(world_to_camera_matrix(Vec3::ZERO, Quat::IDENTITY));
        assert!(t.length() < 1e-6);
        // Host right is engine -X and host up is engine -Y: a half-turn about Z
        assert!(same_rotation(r, Quat::from_xyzw(0.0, 0.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_camera_translation_maps_to_engine_axes() {
        let (t, _) = world_to_engine_pose(world_to_camera_matrix(Vec3::X, Quat::IDENTITY));
        assert!((t + Vec3::X).length() < 1e-6, "t = {:?}", t);

        let (t, _) = world_to_engine_pose(world_to_camera_matrix(Vec3::Y, Quat::IDENTITY));
        assert!((t - Vec3::Y).length() < 1e-6, "t = {:?}", t);
    }

    #[test]
    fn test_engine_round_trip() {
        let position = Vec3::new(0.3, -1.5, 2.25);
        let orientation = Quat::from_euler(glam::EulerRot::YXZ, 0.4, -0.2, 1.1);

        let (t, r) = world_to_engine_pose(world_to_camera_matrix(position, orientation));
        let (p, q) = engine_to_world_pose(t, r);

        assert!((p - position).length() < 1e-5);
        assert!(same_rotation(q, orientation, 1e-5));
    }

    #[test]
    fn test_model_view_matches_engine_pose() {
        let position = Vec3::new(-1.0, 0.5, 3.0);
        let orientation = Quat::from_rotation_x(0.7) * Quat::from_rotation_y(-0.3);

        let (t, r) = world_to_engine_pose(world_to_camera_matrix(position, orientation));
        let model_view = FLIP_YZ * Mat4::from_rotation_translation(r, t);
        let (p, q) = model_view_to_world_pose(model_view, Mat4::IDENTITY);

        assert!((p - position).length() < 1e-4);
        assert!(same_rotation(q, orientation, 1e-4));
    }

    #[test]
    fn test_host_pose_to_engine_mirrors_x() {
        let (p, r) =
            host_pose_to_engine(Vec3::new(1.0, 2.0, 3.0), Quat::from_xyzw(0.1, 0.2, 0.3, 0.9));
        assert_eq!(p, Vec3::new(-1.0, 2.0, 3.0));
        assert_eq!(r, Quat::from_xyzw(0.1, -0.2, -0.3, 0.9));

        assert_eq!(host_vector_to_engine(Vec3::ONE), Vec3::new(-1.0, 1.0, 1.0));
        assert_eq!(engine_position_to_host(host_vector_to_engine(Vec3::ONE)), Vec3::ONE);

        let (mut p, mut r) = (Vec3::ONE, Quat::IDENTITY);
        host_to_engine_in_place(&mut p, &mut r);
        assert_eq!(p, Vec3::new(-1.0, 1.0, 1.0));
    }
}
