//! Rotation extraction helpers

use glam::{Mat3, Mat4, Quat, Vec3};

/// Extracts the rotation of the upper 3x3 block of `m` as a quaternion.
///
/// Picks one of four branches depending on the trace and on which diagonal
/// element dominates, so the square root always works on a value of at least
/// one. The result is not renormalized: a matrix that is not orthonormal
/// yields the nearest best-effort quaternion instead of an error.
pub fn quaternion_from_matrix(m: &Mat4) -> Quat {
    let e = |row: usize, col: usize| m.col(col)[row];

    let (m00, m11, m22) = (e(0, 0), e(1, 1), e(2, 2));
    let trace = m00 + m11 + m22;

    if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        Quat::from_xyzw(
            (e(2, 1) - e(1, 2)) * s,
            (e(0, 2) - e(2, 0)) * s,
            (e(1, 0) - e(0, 1)) * s,
            0.25 / s,
        )
    } else if m00 > m11 && m00 > m22 {
        let s = 2.0 * (1.0 + m00 - m11 - m22).max(0.0).sqrt();
        Quat::from_xyzw(
            0.25 * s,
            (e(0, 1) + e(1, 0)) / s,
            (e(0, 2) + e(2, 0)) / s,
            (e(2, 1) - e(1, 2)) / s,
        )
    } else if m11 > m22 {
        let s = 2.0 * (1.0 + m11 - m00 - m22).max(0.0).sqrt();
        Quat::from_xyzw(
            (e(0, 1) + e(1, 0)) / s,
            0.25 * s,
            (e(1, 2) + e(2, 1)) / s,
            (e(0, 2) - e(2, 0)) / s,
        )
    } else {
        let s = 2.0 * (1.0 + m22 - m00 - m11).max(0.0).sqrt();
        Quat::from_xyzw(
            (e(0, 2) + e(2, 0)) / s,
            (e(1, 2) + e(2, 1)) / s,
            0.25 * s,
            (e(1, 0) - e(0, 1)) / s,
        )
    }
}

/// Rotation whose local Z axis points along `forward` and whose Y axis is as
/// close to `up` as possible (host convention, right = up x forward).
///
/// Degenerate input (zero forward) gives the identity. When `up` is parallel
/// to `forward` the shortest arc from +Z is used.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let z = forward.normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let x = up.cross(z).normalize_or_zero();
    if x == Vec3::ZERO {
        return Quat::from_rotation_arc(Vec3::Z, z);
    }
    let y = z.cross(x);

    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

/// Returns true when `a` and `b` describe the same rotation within
/// `tolerance` per component, accounting for the double cover.
pub fn same_rotation(a: Quat, b: Quat, tolerance: f32) -> bool {
    a.abs_diff_eq(b, tolerance) || a.abs_diff_eq(-b, tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_identity_extraction() {
        let q = quaternion_from_matrix(&Mat4::IDENTITY);
        assert!(same_rotation(q, Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn test_zero_matrix_does_not_produce_nan() {
        let q = quaternion_from_matrix(&Mat4::ZERO);
        assert!(q.is_finite());
    }

    #[test]
    fn test_half_turns_hit_diagonal_branches() {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let q = Quat::from_axis_angle(axis, PI);
            let extracted = quaternion_from_matrix(&Mat4::from_quat(q));
            assert!(extracted.is_finite());
            assert!(same_rotation(extracted, q, 1e-5), "axis {:?}", axis);
        }
    }

    #[test]
    fn test_look_rotation_axes() {
        let q = look_rotation(Vec3::X, Vec3::Y);
        assert!((q * Vec3::Z - Vec3::X).length() < 1e-5);
        assert!((q * Vec3::Y - Vec3::Y).length() < 1e-5);

        let expected = Quat::from_rotation_y(FRAC_PI_2);
        assert!(same_rotation(q, expected, 1e-5));
    }

    #[test]
    fn test_look_rotation_degenerate_inputs() {
        assert_eq!(look_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);

        let q = look_rotation(Vec3::Y, Vec3::Y);
        assert!(q.is_finite());
        assert!((q * Vec3::Z - Vec3::Y).length() < 1e-5);
    }
}
