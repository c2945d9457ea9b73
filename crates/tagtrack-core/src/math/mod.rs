//! Mathematical utilities and type definitions.
//!
//! This module provides the fundamental scalar and linear-algebra types used
//! throughout the workspace, plus small geometric helpers for the line and
//! rotation constructions the tracking pipeline relies on.

use nalgebra::{Isometry3, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

pub mod frames;
pub mod lines;

pub use frames::{
    orthonormalize, rot_z, rotation_from_xy, rotation_from_xz, rotation_from_zx, rotation_from_zy,
};
pub use lines::{closest_points_on_lines, line_plane_intersection, project_point_on_line};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Convert a 2D point in Euclidean coordinates into homogeneous coordinates.
///
/// Given a point `p = (x, y)`, returns the homogeneous vector `(x, y, 1)`.
pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

/// Convert a 3D homogeneous vector back to a 2D point.
///
/// The input is interpreted as `(x, y, w)` and the result is `(x / w, y / w)`.
/// The caller is responsible for ensuring that `w != 0`.
pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Pt2::new(v.x / v.z, v.y / v.z)
}

/// Signed area of a quadrilateral given in winding order, via the shoelace
/// formula, returned as an absolute value in squared input units.
///
/// Detected marker quads use this as a view-confidence proxy: the larger the
/// projected surface, the better conditioned the pose solution.
pub fn quad_area(corners: &[Pt2; 4]) -> Real {
    let mut twice = 0.0;
    for i in 0..4 {
        let a = &corners[i];
        let b = &corners[(i + 1) % 4];
        twice += a.x * b.y - b.x * a.y;
    }
    (twice * 0.5).abs()
}

/// Angle in radians between two rotations, for pose comparisons.
pub fn rotation_angle_between(a: &Iso3, b: &Iso3) -> Real {
    a.rotation.angle_to(&b.rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn homogeneous_round_trip() {
        let p = Pt2::new(3.5, -1.25);
        let h = to_homogeneous(&p);
        assert_relative_eq!(from_homogeneous(&h), p);
    }

    #[test]
    fn quad_area_unit_square() {
        let q = [
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ];
        assert_relative_eq!(quad_area(&q), 1.0);
        // Reversed winding gives the same magnitude.
        let r = [q[3], q[2], q[1], q[0]];
        assert_relative_eq!(quad_area(&r), 1.0);
    }

    #[test]
    fn compose_and_invert_round_trip() {
        let a = Iso3::new(Vec3::new(0.2, -0.4, 1.0), Vec3::new(0.1, 0.2, -0.3));
        let b = Iso3::new(Vec3::new(-1.0, 0.5, 0.25), Vec3::new(0.0, -0.7, 0.05));
        let ab = a * b;
        let back = ab * b.inverse();
        assert_relative_eq!(back.translation.vector, a.translation.vector, epsilon = 1e-12);
        assert!(rotation_angle_between(&back, &a) < 1e-12);

        let c = Iso3::new(Vec3::new(3.0, 0.0, -2.0), Vec3::new(0.3, 0.0, 0.0));
        let left = (a * b) * c;
        let right = a * (b * c);
        assert_relative_eq!(left.translation.vector, right.translation.vector, epsilon = 1e-12);
        assert!(rotation_angle_between(&left, &right) < 1e-12);
    }
}
