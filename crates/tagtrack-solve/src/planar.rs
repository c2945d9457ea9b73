//! Pose of a planar point set from a plane-induced homography.
//!
//! Classic decomposition of the plane-to-image homography into `[r1 r2 | t]`
//! with the third rotation column completed by a cross product and the
//! result projected onto SO(3). Works in normalized image coordinates, so
//! intrinsics and distortion are already removed by the camera model.

use nalgebra::{Rotation3, Translation3, UnitQuaternion};
use tagtrack_core::{square_corners, CameraModel, Iso3, Mat3, Pt2, Pt3, Real, Vec2};

use crate::{dlt_homography, SolveError};

/// Pose of a planar object (points in its own Z = 0 plane) relative to a
/// lens. Returns the lens-from-object transform.
pub fn solve_planar(
    camera: &CameraModel,
    object_pts: &[Pt3],
    image_px: &[Pt2],
) -> Result<Iso3, SolveError> {
    let n = object_pts.len();
    if n < 4 {
        return Err(SolveError::NotEnoughPoints { needed: 4, got: n });
    }
    if image_px.len() != n {
        return Err(SolveError::MismatchedPoints(n, image_px.len()));
    }

    let src: Vec<Vec2> = object_pts.iter().map(|p| Vec2::new(p.x, p.y)).collect();
    let dst: Vec<Vec2> = image_px.iter().map(|p| camera.normalize_pixel(p)).collect();

    let h = dlt_homography(&src, &dst)?;
    pose_from_homography(&h)
}

/// Pose of a single square marker of the given side length, the cheap and
/// well-conditioned special case the tracker prefers whenever an object is
/// seen through exactly one marker. Corners are in detector winding order.
/// Returns the lens-from-marker transform.
pub fn solve_square(
    camera: &CameraModel,
    side: Real,
    corners: &[Pt2; 4],
) -> Result<Iso3, SolveError> {
    if side <= 0.0 {
        return Err(SolveError::DegeneratePoints);
    }
    solve_planar(camera, &square_corners(side), corners)
}

fn pose_from_homography(h: &Mat3) -> Result<Iso3, SolveError> {
    // The DLT fixes H only up to sign; the plane must sit in front of the
    // lens, so t_z (the h22-bearing column) has to come out positive.
    let h = if h[(2, 2)] < 0.0 { -h } else { *h };

    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    // Scale factor λ: normalize first two columns (average for robustness)
    let norm1 = h1.norm();
    let norm2 = h2.norm();
    let mean_norm = (norm1 + norm2) * 0.5;
    if mean_norm < 1e-12 {
        return Err(SolveError::DegeneratePoints);
    }
    let lambda = 1.0 / mean_norm;

    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let r3 = r1.cross(&r2);

    let mut r_mat = Mat3::zeros();
    r_mat.set_column(0, &r1);
    r_mat.set_column(1, &r2);
    r_mat.set_column(2, &r3);

    // Project onto SO(3) (polar decomposition via SVD)
    let svd = r_mat.svd(true, true);
    let u = svd.u.ok_or(SolveError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(SolveError::SvdFailed)?;
    let mut r_orth = u * v_t;
    if r_orth.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r_orth = u_flipped * v_t;
    }

    let t_vec = h3 * lambda;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_orth));
    Ok(Iso3::from_parts(Translation3::from(t_vec), rot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tagtrack_core::rotation_angle_between;
    use tagtrack_core::synthetic::{default_camera, looking_at, project_detection};
    use tagtrack_core::{Distortion, Intrinsics, Pt3};

    #[test]
    fn square_marker_pose_recovers_ground_truth() {
        let cam = default_camera();
        let world_from_lens = looking_at(&Pt3::new(0.3, -0.5, 1.2), &Pt3::origin());
        let world_from_marker = Iso3::rotation(tagtrack_core::Vec3::new(0.0, 0.15, 0.4));

        let det = project_detection(
            &cam,
            &world_from_lens.inverse(),
            &world_from_marker,
            0,
            0.1,
        )
        .unwrap();

        let est = solve_square(&cam, 0.1, &det.corners).unwrap();
        let gt = world_from_lens.inverse() * world_from_marker;

        assert_relative_eq!(est.translation.vector, gt.translation.vector, epsilon = 1e-6);
        assert!(rotation_angle_between(&est, &gt) < 1e-6);
    }

    #[test]
    fn distorted_pixels_are_handled_by_the_camera_model() {
        let cam = CameraModel::new(
            Intrinsics {
                fx: 800.0,
                fy: 790.0,
                cx: 640.0,
                cy: 360.0,
                skew: 0.0,
            },
            Distortion {
                k1: -0.15,
                k2: 0.03,
                k3: 0.0,
                p1: 5e-5,
                p2: -4e-5,
                iters: 0,
            },
        );
        let world_from_lens = looking_at(&Pt3::new(0.1, 0.2, 0.9), &Pt3::origin());
        let world_from_marker = Iso3::identity();

        let det =
            project_detection(&cam, &world_from_lens.inverse(), &world_from_marker, 0, 0.08)
                .unwrap();
        let est = solve_square(&cam, 0.08, &det.corners).unwrap();
        let gt = world_from_lens.inverse();

        assert_relative_eq!(est.translation.vector, gt.translation.vector, epsilon = 1e-5);
        assert!(rotation_angle_between(&est, &gt) < 1e-5);
    }

    #[test]
    fn multi_marker_coplanar_set_solves_as_one_plane() {
        let cam = default_camera();
        let lens_from_object = Iso3::new(
            tagtrack_core::Vec3::new(0.05, -0.1, 1.4),
            tagtrack_core::Vec3::new(0.2, -0.1, 0.05),
        );

        // Two markers on the object's Z = 0 plane, offset along X.
        let mut object = Vec::new();
        let mut image = Vec::new();
        for offset in [-0.2_f64, 0.2] {
            for c in square_corners(0.1) {
                let p = Pt3::new(c.x + offset, c.y, 0.0);
                object.push(p);
                let px = cam.project_point(&lens_from_object.transform_point(&p)).unwrap();
                image.push(Pt2::from(px));
            }
        }

        let est = solve_planar(&cam, &object, &image).unwrap();
        assert_relative_eq!(
            est.translation.vector,
            lens_from_object.translation.vector,
            epsilon = 1e-6
        );
        assert!(rotation_angle_between(&est, &lens_from_object) < 1e-6);
    }

    #[test]
    fn degenerate_inputs_return_errors() {
        let cam = default_camera();
        let corners = [
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ];
        assert_eq!(
            solve_square(&cam, -0.1, &corners),
            Err(SolveError::DegeneratePoints)
        );
        assert_eq!(
            solve_planar(&cam, &[Pt3::origin(); 3], &[Pt2::origin(); 3]),
            Err(SolveError::NotEnoughPoints { needed: 4, got: 3 })
        );
        assert_eq!(
            solve_planar(&cam, &[Pt3::origin(); 4], &[Pt2::origin(); 5]),
            Err(SolveError::MismatchedPoints(4, 5))
        );
    }
}
