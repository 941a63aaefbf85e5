//! Axis flips and the fixed half-turn used by the camera conversions.

use glam::Mat4;

const fn scale(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_cols_array(&[
        x, 0.0, 0.0, 0.0, //
        0.0, y, 0.0, 0.0, //
        0.0, 0.0, z, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ])
}

/// Mirror along the X axis.
pub const FLIP_X: Mat4 = scale(-1.0, 1.0, 1.0);

/// Mirror along the Y axis.
pub const FLIP_Y: Mat4 = scale(1.0, -1.0, 1.0);

/// Mirror along the Z axis.
pub const FLIP_Z: Mat4 = scale(1.0, 1.0, -1.0);

/// Half-turn about Z, written as a double flip.
pub const FLIP_XY: Mat4 = scale(-1.0, -1.0, 1.0);

/// Half-turn about X. Converts OpenGL camera axes into engine camera axes.
pub const FLIP_YZ: Mat4 = scale(1.0, -1.0, -1.0);

/// Point reflection through the origin.
pub const FLIP_XYZ: Mat4 = scale(-1.0, -1.0, -1.0);

/// 180 degree rotation about the vertical axis.
///
/// Kept exact instead of going through `Mat4::from_rotation_y(PI)`, which
/// leaves `sin(PI)` noise in the off-diagonal terms.
pub const ROTATION_Y180: Mat4 = scale(-1.0, 1.0, -1.0);

/// All flips, in declaration order.
pub const ALL_FLIPS: [Mat4; 6] = [FLIP_X, FLIP_Y, FLIP_Z, FLIP_XY, FLIP_YZ, FLIP_XYZ];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flips_are_self_inverse() {
        for flip in ALL_FLIPS {
            assert_eq!(flip * flip, Mat4::IDENTITY);
        }
        assert_eq!(ROTATION_Y180 * ROTATION_Y180, Mat4::IDENTITY);
    }

    #[test]
    fn test_double_flips_compose() {
        assert_eq!(FLIP_X * FLIP_Y, FLIP_XY);
        assert_eq!(FLIP_Y * FLIP_Z, FLIP_YZ);
        assert_eq!(FLIP_XY * FLIP_Z, FLIP_XYZ);
        // A flip on X and Z is the vertical half-turn
        assert_eq!(FLIP_X * FLIP_Z, ROTATION_Y180);
    }

    #[test]
    fn test_determinants() {
        assert_eq!(FLIP_X.determinant(), -1.0);
        assert_eq!(FLIP_XY.determinant(), 1.0);
        assert_eq!(FLIP_XYZ.determinant(), -1.0);
    }
}
