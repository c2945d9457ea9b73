use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Real, Vec2};

/// Standard pinhole intrinsics with optional skew.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
    /// Skew term (typically 0).
    pub skew: Real,
}

impl Intrinsics {
    /// Return the 3x3 camera intrinsics matrix K.
    pub fn k_matrix(&self) -> Mat3 {
        Mat3::new(
            self.fx, self.skew, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0,
        )
    }

    /// Convert normalized sensor-plane coordinates into pixel coordinates.
    pub fn sensor_to_pixel(&self, sensor: &Vec2) -> Vec2 {
        let u = self.fx * sensor.x + self.skew * sensor.y + self.cx;
        let v = self.fy * sensor.y + self.cy;
        Vec2::new(u, v)
    }

    /// Convert pixel coordinates into normalized sensor-plane coordinates.
    pub fn pixel_to_sensor(&self, pixel: &Vec2) -> Vec2 {
        let sy = (pixel.y - self.cy) / self.fy;
        let sx = (pixel.x - self.cx - self.skew * sy) / self.fx;
        Vec2::new(sx, sy)
    }
}
