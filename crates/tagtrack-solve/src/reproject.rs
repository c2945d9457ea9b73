//! Reprojection of solved poses back into the image.

use tagtrack_core::{CameraModel, Iso3, Pt2, Pt3, Real, Vec2};

/// Project object-frame points through a lens-from-object pose.
///
/// Entries are `None` where the point falls at or behind the lens plane.
pub fn project_points(
    camera: &CameraModel,
    lens_from_object: &Iso3,
    object: &[Pt3],
) -> Vec<Option<Vec2>> {
    object
        .iter()
        .map(|p| camera.project_point(&lens_from_object.transform_point(p)))
        .collect()
}

/// Project a corner quad, all-or-nothing.
pub fn project_quad(
    camera: &CameraModel,
    lens_from_object: &Iso3,
    corners: &[Pt3; 4],
) -> Option<[Pt2; 4]> {
    let mut out = [Pt2::origin(); 4];
    for (slot, p) in out.iter_mut().zip(corners.iter()) {
        let px = camera.project_point(&lens_from_object.transform_point(p))?;
        *slot = Pt2::from(px);
    }
    Some(out)
}

/// Summed pixel distance between reprojected and observed points.
///
/// An unprojectable point makes the whole error infinite, which downstream
/// scoring treats as an unusable view. Callers divide by their own unit of
/// interest (the tracker divides by markers seen).
pub fn reprojection_error(
    camera: &CameraModel,
    lens_from_object: &Iso3,
    object: &[Pt3],
    image: &[Pt2],
) -> Real {
    if object.len() != image.len() || object.is_empty() {
        return Real::INFINITY;
    }
    let mut sum = 0.0;
    for (po, px) in object.iter().zip(image.iter()) {
        match camera.project_point(&lens_from_object.transform_point(po)) {
            Some(projected) => sum += (projected - px.coords).norm(),
            None => return Real::INFINITY,
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tagtrack_core::square_corners;
    use tagtrack_core::synthetic::default_camera;

    #[test]
    fn exact_pose_has_zero_error() {
        let cam = default_camera();
        let pose = Iso3::translation(0.05, -0.02, 1.0);
        let object = square_corners(0.1);
        let image: Vec<Pt2> = project_points(&cam, &pose, &object)
            .into_iter()
            .map(|p| Pt2::from(p.unwrap()))
            .collect();

        assert_relative_eq!(reprojection_error(&cam, &pose, &object, &image), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn shifted_pose_accumulates_pixel_error() {
        let cam = default_camera();
        let pose = Iso3::translation(0.0, 0.0, 1.0);
        let object = square_corners(0.1);
        let image: Vec<Pt2> = project_points(&cam, &pose, &object)
            .into_iter()
            .map(|p| Pt2::from(p.unwrap()))
            .collect();

        // 1 mm sideways at 1 m with f = 800 -> 0.8 px per corner.
        let shifted = Iso3::translation(0.001, 0.0, 1.0);
        let err = reprojection_error(&cam, &shifted, &object, &image);
        assert_relative_eq!(err, 4.0 * 0.8, epsilon = 1e-3);
    }

    #[test]
    fn behind_lens_is_infinite() {
        let cam = default_camera();
        let pose = Iso3::translation(0.0, 0.0, -1.0);
        let object = square_corners(0.1);
        let image = vec![Pt2::origin(); 4];
        assert!(reprojection_error(&cam, &pose, &object, &image).is_infinite());
    }

    #[test]
    fn quad_projection_is_all_or_nothing() {
        let cam = default_camera();
        let corners = square_corners(0.1);
        assert!(project_quad(&cam, &Iso3::translation(0.0, 0.0, 1.0), &corners).is_some());

        // Tilted upright close to the lens: two corners end up behind it.
        let straddling = Iso3::new(
            tagtrack_core::Vec3::new(0.0, 0.0, 0.03),
            tagtrack_core::Vec3::new(std::f64::consts::FRAC_PI_2, 0.0, 0.0),
        );
        assert!(project_quad(&cam, &straddling, &corners).is_none());
    }
}
