//! Rotation builders from pairs of approximately known axes.
//!
//! Marker and board layouts are described by which way two of their axes
//! point; these helpers turn such a pair into a proper rotation. The first
//! axis is kept exactly, the second is re-orthogonalized against it and the
//! third completes the right-handed frame.

use nalgebra::Rotation3;

use super::{Mat3, Real, Vec3};

/// Component of `v` orthogonal to the unit vector `base`, normalized.
///
/// `base` must be unit length and `v` must not be parallel to it.
pub fn orthonormalize(base: &Vec3, v: &Vec3) -> Vec3 {
    (v - base * base.dot(v)).normalize()
}

fn from_columns(x: Vec3, y: Vec3, z: Vec3) -> Rotation3<Real> {
    let mut m = Mat3::zeros();
    m.set_column(0, &x);
    m.set_column(1, &y);
    m.set_column(2, &z);
    Rotation3::from_matrix_unchecked(m)
}

/// Rotation whose X axis is `x` and whose Y axis is as close to `y` as
/// orthogonality allows. The axes must not be parallel.
pub fn rotation_from_xy(x: &Vec3, y: &Vec3) -> Rotation3<Real> {
    let xv = x.normalize();
    let yv = orthonormalize(&xv, y);
    let zv = xv.cross(&yv);
    from_columns(xv, yv, zv)
}

/// Rotation whose X axis is `x` and whose Z axis is as close to `z` as
/// orthogonality allows.
pub fn rotation_from_xz(x: &Vec3, z: &Vec3) -> Rotation3<Real> {
    let xv = x.normalize();
    let zv = orthonormalize(&xv, z);
    let yv = zv.cross(&xv);
    from_columns(xv, yv, zv)
}

/// Rotation whose Z axis is `z` and whose X axis is as close to `x` as
/// orthogonality allows. Board and marker layouts are usually stated this
/// way: the face normal plus the direction the printed tag's X edge runs.
pub fn rotation_from_zx(z: &Vec3, x: &Vec3) -> Rotation3<Real> {
    let zv = z.normalize();
    let xv = orthonormalize(&zv, x);
    let yv = zv.cross(&xv);
    from_columns(xv, yv, zv)
}

/// Rotation whose Z axis is `z` and whose Y axis is as close to `y` as
/// orthogonality allows.
pub fn rotation_from_zy(z: &Vec3, y: &Vec3) -> Rotation3<Real> {
    let zv = z.normalize();
    let yv = orthonormalize(&zv, y);
    let xv = yv.cross(&zv);
    from_columns(xv, yv, zv)
}

/// Yaw of a rotation: angle of its X axis projected onto the world XY plane.
pub fn rot_z(rotation: &Rotation3<Real>) -> Real {
    let x_axis = rotation * Vec3::x();
    x_axis.y.atan2(x_axis.x)
}
