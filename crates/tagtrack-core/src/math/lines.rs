//! Line and plane intersection helpers used by the multi-view fusion stage.

use super::{Pt3, Real, Vec3};

/// Near-parallel tolerance for the denominators below.
const PARALLEL_EPS: Real = 1e-9;

/// Closest pair of points between two infinite 3D lines.
///
/// Each line is given as an origin and a direction (not necessarily unit
/// length). Returns the point on the first line and the point on the second
/// line where the lines pass closest to each other, or `None` when the lines
/// are (near-)parallel and no unique pair exists.
pub fn closest_points_on_lines(
    origin1: &Pt3,
    dir1: &Vec3,
    origin2: &Pt3,
    dir2: &Vec3,
) -> Option<(Pt3, Pt3)> {
    let p13 = origin1 - origin2;

    let d1343 = p13.dot(dir2);
    let d4321 = dir2.dot(dir1);
    let d1321 = p13.dot(dir1);
    let d4343 = dir2.dot(dir2);
    let d2121 = dir1.dot(dir1);

    let denom = d2121 * d4343 - d4321 * d4321;
    if denom.abs() < PARALLEL_EPS || d4343.abs() < PARALLEL_EPS {
        return None;
    }

    let mua = (d1343 * d4321 - d1321 * d4343) / denom;
    let mub = (d1343 + d4321 * mua) / d4343;

    Some((origin1 + dir1 * mua, origin2 + dir2 * mub))
}

/// Intersection of a line with a plane.
///
/// Directions are normalized internally. Returns `None` when the line runs
/// (near-)parallel to the plane, in which case there is no usable
/// intersection; callers treat that as a recoverable miss.
pub fn line_plane_intersection(
    line_origin: &Pt3,
    line_dir: &Vec3,
    plane_origin: &Pt3,
    plane_normal: &Vec3,
) -> Option<Pt3> {
    let d = line_dir.normalize();
    let n = plane_normal.normalize();

    let denom = n.dot(&d);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }

    let t = (plane_origin - line_origin).dot(&n) / denom;
    Some(line_origin + d * t)
}

/// Orthogonal projection of a point onto an infinite line.
pub fn project_point_on_line(point: &Pt3, line_origin: &Pt3, line_dir: &Vec3) -> Pt3 {
    let d = line_dir.normalize();
    let t = (point - line_origin).dot(&d);
    line_origin + d * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn skew_lines_closest_points() {
        // Line 1 along X at z = 0, line 2 along Y at z = 1, offset in x.
        let (pa, pb) = closest_points_on_lines(
            &Pt3::new(0.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Pt3::new(2.0, -3.0, 1.0),
            &Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(pa, Pt3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(pb, Pt3::new(2.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn intersecting_lines_meet_at_one_point() {
        let (pa, pb) = closest_points_on_lines(
            &Pt3::new(-1.0, -1.0, 0.5),
            &Vec3::new(1.0, 1.0, 0.0),
            &Pt3::new(1.0, -1.0, 0.5),
            &Vec3::new(-1.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(pa, Pt3::new(0.0, 0.0, 0.5), epsilon = 1e-12);
        assert_relative_eq!(pa, pb, epsilon = 1e-12);
    }

    #[test]
    fn parallel_lines_have_no_unique_answer() {
        let got = closest_points_on_lines(
            &Pt3::new(0.0, 0.0, 0.0),
            &Vec3::new(1.0, 2.0, 0.0),
            &Pt3::new(0.0, 1.0, 0.0),
            &Vec3::new(2.0, 4.0, 0.0),
        );
        assert!(got.is_none());
    }

    #[test]
    fn line_hits_plane() {
        let p = line_plane_intersection(
            &Pt3::new(0.0, 0.0, 2.0),
            &Vec3::new(0.0, 0.0, -3.0),
            &Pt3::new(5.0, 5.0, 0.5),
            &Vec3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(p, Pt3::new(0.0, 0.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn line_parallel_to_plane_misses() {
        let got = line_plane_intersection(
            &Pt3::new(0.0, 0.0, 2.0),
            &Vec3::new(1.0, 1.0, 0.0),
            &Pt3::origin(),
            &Vec3::new(0.0, 0.0, 1.0),
        );
        assert!(got.is_none());
    }

    #[test]
    fn point_projects_onto_line() {
        let p = project_point_on_line(
            &Pt3::new(3.0, 4.0, 0.0),
            &Pt3::origin(),
            &Vec3::new(2.0, 0.0, 0.0),
        );
        assert_relative_eq!(p, Pt3::new(3.0, 0.0, 0.0), epsilon = 1e-12);
    }
}
