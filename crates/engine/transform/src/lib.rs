//! Coordinate conversions between the host engine and the tracking engine
//!
//! The host renders in a left-handed, Y-up frame. The tracking engine speaks a
//! right-handed convention on the wire (x: right, y: down, z: into the scene
//! for camera poses). Everything in this crate is a pure function over `glam`
//! types, so it can be used from any thread.
//!
//! - **Flip matrices**: diagonal ±1 scale matrices, each its own inverse
//! - **Quaternion extraction**: branch-selected extraction from rotation matrices
//! - **Camera poses**: host view matrices to engine poses and back
//! - **Model transforms**: translation, rotation and non-uniform scale with
//!   composition and inversion
//! - **Init poses**: the `{ "t": [..], "r": [..] }` pose shape sent to the engine
//!
//! # Example
//!
//! ```rust
//! use glam::{Quat, Vec3};
//! use tracklink_transform::{engine_to_world_pose, world_to_camera_matrix, world_to_engine_pose};
//!
//! let position = Vec3::new(0.5, 1.2, -2.0);
//! let orientation = Quat::from_rotation_y(0.3);
//!
//! let (t, r) = world_to_engine_pose(world_to_camera_matrix(position, orientation));
//! let (back, _) = engine_to_world_pose(t, r);
//! assert!((back - position).length() < 1e-5);
//! ```

pub mod flip;
pub mod init_pose;
pub mod model_transform;
pub mod pose;
pub mod render_rotation;
pub mod rotation;
pub mod wire;

pub use flip::{FLIP_X, FLIP_XY, FLIP_XYZ, FLIP_Y, FLIP_YZ, FLIP_Z, ROTATION_Y180};
pub use init_pose::InitPose;
pub use model_transform::ModelTransform;
pub use pose::{
    engine_position_to_host, engine_to_world_pose, host_pose_to_engine, host_to_engine_in_place,
    host_vector_to_engine, model_view_to_world_pose, world_to_camera_matrix, world_to_engine_pose,
};
pub use render_rotation::{NaturalOrientation, RenderRotation, ScreenOrientation};
pub use rotation::{look_rotation, quaternion_from_matrix, same_rotation};
