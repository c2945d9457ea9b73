//! Translation smoothing for mobile objects.

use tagtrack_core::{Real, Vec3};

/// Constant-velocity alpha-beta filter over an object's world translation.
///
/// Only the translation is filtered; orientation passes through as measured.
/// The first measurement seeds the state, a forced placement resets it.
#[derive(Debug, Clone)]
pub struct TranslationFilter {
    alpha: Real,
    beta: Real,
    state: Option<FilterState>,
}

#[derive(Debug, Clone)]
struct FilterState {
    position: Vec3,
    velocity: Vec3,
}

impl Default for TranslationFilter {
    fn default() -> Self {
        // Critically damped pair for alpha = 0.5: beta = alpha^2 / (2 - alpha).
        Self::new(0.5, 0.5 * 0.5 / 1.5)
    }
}

impl TranslationFilter {
    pub fn new(alpha: Real, beta: Real) -> Self {
        Self {
            alpha,
            beta,
            state: None,
        }
    }

    /// Drop history; the next update adopts its measurement unchanged.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Blend a measured position into the track. `dt` is the time in seconds
    /// since the previous update.
    pub fn update(&mut self, measured: Vec3, dt: Real) -> Vec3 {
        match &mut self.state {
            None => {
                self.state = Some(FilterState {
                    position: measured,
                    velocity: Vec3::zeros(),
                });
                measured
            }
            Some(s) => {
                let predicted = s.position + s.velocity * dt;
                let residual = measured - predicted;
                s.position = predicted + residual * self.alpha;
                if dt > 1e-6 {
                    s.velocity += residual * (self.beta / dt);
                }
                s.position
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_measurement_is_adopted() {
        let mut f = TranslationFilter::default();
        let m = Vec3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(f.update(m, 0.0), m);
    }

    #[test]
    fn repeated_measurements_converge() {
        let mut f = TranslationFilter::default();
        f.update(Vec3::zeros(), 0.0);
        let target = Vec3::new(1.0, 0.0, 0.0);
        let mut last = Vec3::zeros();
        for _ in 0..30 {
            last = f.update(target, 0.033);
        }
        assert_relative_eq!(last, target, epsilon = 1e-3);
    }

    #[test]
    fn single_outlier_is_damped() {
        let mut f = TranslationFilter::default();
        f.update(Vec3::zeros(), 0.0);
        f.update(Vec3::zeros(), 0.033);
        let smoothed = f.update(Vec3::new(0.5, 0.0, 0.0), 0.033);
        assert!(smoothed.x < 0.3, "outlier passed through: {}", smoothed.x);
    }

    #[test]
    fn reset_forgets_velocity() {
        let mut f = TranslationFilter::default();
        f.update(Vec3::zeros(), 0.0);
        f.update(Vec3::new(1.0, 0.0, 0.0), 0.1);
        f.reset();
        let m = Vec3::new(5.0, 5.0, 5.0);
        assert_relative_eq!(f.update(m, 0.1), m);
    }
}
