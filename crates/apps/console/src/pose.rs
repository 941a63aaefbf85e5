//! `pose` subcommand: host camera pose to engine init pose and back

use glam::{Mat4, Quat, Vec3};
use serde::Serialize;
use tracklink_transform::{
    model_view_to_world_pose, world_to_camera_matrix, InitPose, RenderRotation, FLIP_YZ,
};

/// Parses `x,y,z`
pub fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let values = parse_floats::<3>(s)?;
    Ok(Vec3::from_array(values))
}

/// Parses `x,y,z,w` into a normalized quaternion
pub fn parse_quat(s: &str) -> Result<Quat, String> {
    let values = parse_floats::<4>(s)?;
    let q = Quat::from_array(values);
    if q.length_squared() < f32::EPSILON {
        return Err("rotation must not be zero".to_string());
    }
    Ok(q.normalize())
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma separated numbers, got '{s}'"));
    }
    let mut values = [0.0; N];
    for (value, part) in values.iter_mut().zip(parts) {
        let parsed: f32 = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
        if !parsed.is_finite() {
            return Err(format!("'{part}' is not a finite number"));
        }
        *value = parsed;
    }
    Ok(values)
}

/// Result of converting a host camera pose
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseReport {
    pub render_rotation: u32,
    pub init_pose: InitPose,
    /// Host position recovered from the engine pose
    pub position: [f32; 3],
    /// Host orientation recovered from the engine pose
    pub rotation: [f32; 4],
}

pub fn convert(position: Vec3, orientation: Quat, rotation: RenderRotation) -> PoseReport {
    let init_pose = InitPose::from_camera(world_to_camera_matrix(position, orientation), rotation);

    let model_view =
        FLIP_YZ * Mat4::from_rotation_translation(init_pose.rotation(), init_pose.translation());
    let (back_position, back_rotation) =
        model_view_to_world_pose(model_view, rotation.matrix_engine_to_host());

    PoseReport {
        render_rotation: rotation.degrees(),
        init_pose,
        position: back_position.to_array(),
        rotation: back_rotation.to_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracklink_transform::same_rotation;

    #[test]
    fn test_parse_vectors() {
        assert_eq!(parse_vec3("1, 2.5,-3").unwrap(), Vec3::new(1.0, 2.5, -3.0));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,two,3").is_err());
        assert!(parse_vec3("nan,0,0").is_err());
        assert!(parse_vec3("0,inf,0").is_err());
        assert!(parse_quat("0,0,-infinity,1").is_err());

        let q = parse_quat("0,0,0,2").unwrap();
        assert!((q.w - 1.0).abs() < 1e-6);
        assert!(parse_quat("0,0,0,0").is_err());
    }

    #[test]
    fn test_convert_recovers_pose() {
        let position = Vec3::new(0.2, 1.4, -1.0);
        let orientation = Quat::from_rotation_y(0.6);

        for rotation in [RenderRotation::Ccw0, RenderRotation::Ccw90, RenderRotation::Ccw270] {
            let report = convert(position, orientation, rotation);
            assert!((Vec3::from_array(report.position) - position).length() < 1e-4);
            assert!(same_rotation(Quat::from_array(report.rotation), orientation, 1e-4));
        }
    }
}
