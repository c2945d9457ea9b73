//! Synthetic observation helpers for tests, examples and benchmarks.
//!
//! These build exact (noise-free) marker detections from ground-truth poses
//! so solver output can be compared against known transforms.

use nalgebra::{Translation3, UnitQuaternion};

use crate::math::{rotation_from_zx, Iso3, Pt2, Pt3, Vec3};
use crate::models::{CameraModel, Distortion, Intrinsics};
use crate::observations::MarkerDetection;
use crate::square_corners;
use crate::Real;

/// A distortion-free 720p-ish camera, good enough for most fixtures.
pub fn default_camera() -> CameraModel {
    CameraModel::new(
        Intrinsics {
            fx: 800.0,
            fy: 800.0,
            cx: 640.0,
            cy: 360.0,
            skew: 0.0,
        },
        Distortion::default(),
    )
}

/// World pose of a camera placed at `eye` looking at `target`.
///
/// Camera convention: +Z forward, +X right. The image X axis is kept
/// horizontal (world XY plane) where possible.
pub fn looking_at(eye: &Pt3, target: &Pt3) -> Iso3 {
    let forward = (target - eye).normalize();
    let mut x_hint = forward.cross(&Vec3::z());
    if x_hint.norm() < 1e-9 {
        x_hint = Vec3::x();
    }
    let rot = rotation_from_zx(&forward, &x_hint);
    Iso3::from_parts(
        Translation3::from(eye.coords),
        UnitQuaternion::from_rotation_matrix(&rot),
    )
}

/// Project one marker into a lens, returning the exact detection.
///
/// `lens_from_world` maps world points into the lens frame;
/// `world_from_marker` places the marker (its Z axis is the face normal).
/// Returns `None` if the marker faces away from the lens or any corner
/// falls behind it; a detector only reads the printed side.
pub fn project_detection(
    camera: &CameraModel,
    lens_from_world: &Iso3,
    world_from_marker: &Iso3,
    id: u32,
    side: Real,
) -> Option<MarkerDetection> {
    let lens_from_marker = lens_from_world * world_from_marker;
    let normal = lens_from_marker.rotation * Vec3::z();
    if normal.dot(&lens_from_marker.translation.vector) >= 0.0 {
        return None;
    }
    let mut corners = [Pt2::origin(); 4];
    for (slot, local) in corners.iter_mut().zip(square_corners(side)) {
        let in_lens = lens_from_marker.transform_point(&local);
        let px = camera.project_point(&in_lens)?;
        *slot = Pt2::from(px);
    }
    Some(MarkerDetection { id, corners })
}
