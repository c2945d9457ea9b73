use serde::{Deserialize, Serialize};

use crate::math::{Real, Vec2};

/// Brown-Conrady distortion with three radial and two tangential terms.
///
/// `iters` bounds the fixed-point undistortion loop; 0 selects the default
/// of 8 iterations.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: Real,
    pub k2: Real,
    pub k3: Real,
    pub p1: Real,
    pub p2: Real,
    pub iters: u32,
}

impl Distortion {
    fn distort_impl(&self, x: Real, y: Real) -> (Real, Real) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;

        let x2 = x * x;
        let y2 = y * y;
        let xy = x * y;

        let x_tan = 2.0 * self.p1 * xy + self.p2 * (r2 + 2.0 * x2);
        let y_tan = self.p1 * (r2 + 2.0 * y2) + 2.0 * self.p2 * xy;

        (x * radial + x_tan, y * radial + y_tan)
    }

    /// Apply distortion to undistorted normalized coordinates.
    pub fn distort(&self, n_undist: &Vec2) -> Vec2 {
        let (xd, yd) = self.distort_impl(n_undist.x, n_undist.y);
        Vec2::new(xd, yd)
    }

    /// Remove distortion by fixed-point iteration.
    pub fn undistort(&self, n_dist: &Vec2) -> Vec2 {
        let mut x = n_dist.x;
        let mut y = n_dist.y;

        let iters = if self.iters == 0 { 8 } else { self.iters };
        for _ in 0..iters {
            let (xd, yd) = self.distort_impl(x, y);
            x -= xd - n_dist.x;
            y -= yd - n_dist.y;
        }
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn undistort_inverts_distort() {
        let d = Distortion {
            k1: -0.28,
            k2: 0.07,
            k3: 0.0,
            p1: 1e-4,
            p2: -2e-4,
            iters: 0,
        };
        let n = Vec2::new(0.3, -0.2);
        let nd = d.distort(&n);
        assert_relative_eq!(d.undistort(&nd), n, epsilon = 1e-9);
    }

    #[test]
    fn zero_coefficients_are_identity() {
        let d = Distortion::default();
        let n = Vec2::new(0.4, 0.1);
        assert_relative_eq!(d.distort(&n), n);
        assert_relative_eq!(d.undistort(&n), n);
    }
}
