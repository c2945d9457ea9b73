use serde::{Deserialize, Serialize};

use super::{Distortion, Intrinsics};
use crate::math::{Pt2, Pt3, Vec2, Vec3};

/// Calibrated pinhole camera: intrinsics plus Brown-Conrady distortion.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraModel {
    pub intrinsics: Intrinsics,
    pub distortion: Distortion,
}

impl CameraModel {
    pub fn new(intrinsics: Intrinsics, distortion: Distortion) -> Self {
        Self {
            intrinsics,
            distortion,
        }
    }

    /// Project a camera-frame point to pixel coordinates.
    ///
    /// Returns `None` for points at or behind the camera plane.
    pub fn project_point(&self, p_c: &Pt3) -> Option<Vec2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let n_u = Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z);
        let n_d = self.distortion.distort(&n_u);
        Some(self.intrinsics.sensor_to_pixel(&n_d))
    }

    /// Undistorted normalized image coordinates of a pixel.
    ///
    /// This is the input representation the linear pose solvers work in.
    pub fn normalize_pixel(&self, px: &Pt2) -> Vec2 {
        let n_d = self.intrinsics.pixel_to_sensor(&px.coords);
        self.distortion.undistort(&n_d)
    }

    /// Unit ray in the camera frame through a pixel.
    pub fn backproject_pixel(&self, px: &Pt2) -> Vec3 {
        let n_u = self.normalize_pixel(px);
        Vec3::new(n_u.x, n_u.y, 1.0).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> CameraModel {
        CameraModel::new(
            Intrinsics {
                fx: 800.0,
                fy: 780.0,
                cx: 640.0,
                cy: 360.0,
                skew: 0.0,
            },
            Distortion {
                k1: -0.2,
                k2: 0.05,
                k3: 0.0,
                p1: 1e-4,
                p2: -5e-5,
                iters: 0,
            },
        )
    }

    #[test]
    fn project_then_backproject_recovers_ray() {
        let cam = camera();
        let p = Pt3::new(0.2, -0.1, 1.5);
        let px = cam.project_point(&p).unwrap();
        let ray = cam.backproject_pixel(&Pt2::from(px));
        let expected = p.coords.normalize();
        assert_relative_eq!(ray, expected, epsilon = 1e-9);
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        let cam = camera();
        assert!(cam.project_point(&Pt3::new(0.1, 0.1, -0.5)).is_none());
        assert!(cam.project_point(&Pt3::new(0.1, 0.1, 0.0)).is_none());
    }

    #[test]
    fn normalize_pixel_inverts_projection() {
        let cam = camera();
        let p = Pt3::new(-0.3, 0.25, 2.0);
        let px = cam.project_point(&p).unwrap();
        let n = cam.normalize_pixel(&Pt2::from(px));
        assert_relative_eq!(n, Vec2::new(p.x / p.z, p.y / p.z), epsilon = 1e-9);
    }

    #[test]
    fn camera_json_round_trip() {
        let cam = camera();
        let text = serde_json::to_string(&cam).unwrap();
        let back: CameraModel = serde_json::from_str(&text).unwrap();
        assert_relative_eq!(back.intrinsics.fx, cam.intrinsics.fx);
        assert_relative_eq!(back.distortion.k1, cam.distortion.k1);
    }
}
