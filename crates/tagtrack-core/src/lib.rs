//! Core geometry and data types for the `tagtrack` workspace.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Iso3`, ...) and the line
//!   and rotation-frame helpers the fusion stage builds on,
//! - the calibrated camera model (pinhole intrinsics + Brown-Conrady
//!   distortion),
//! - per-frame observation types exchanged with marker detectors,
//! - the capture-clock tick conventions,
//! - synthetic projection fixtures for tests and examples.

/// Linear algebra type aliases and geometric helpers.
pub mod math;
/// Camera model.
pub mod models;
/// Per-camera marker observations.
pub mod observations;
/// Synthetic data helpers.
pub mod synthetic;
/// Capture-clock ticks.
pub mod time;

pub use math::*;
pub use models::*;
pub use observations::*;
pub use time::{seconds_between, Tick, DISPLAY_WINDOW, FORCE_POSE, TICKS_PER_SECOND};

/// Size of the marker dictionary in use (4x4, 100 entries).
///
/// Marker IDs index dense per-dictionary arrays, so every ID must be below
/// this bound.
pub const MARKER_DICT_SIZE: usize = 100;

/// Corners of a face-up square marker of the given side length, centered on
/// the origin in its own frame (Z = 0), in detector winding order:
/// top-left, top-right, bottom-right, bottom-left.
pub fn square_corners(side: Real) -> [Pt3; 4] {
    let h = side * 0.5;
    [
        Pt3::new(-h, h, 0.0),
        Pt3::new(h, h, 0.0),
        Pt3::new(h, -h, 0.0),
        Pt3::new(-h, -h, 0.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_corners_winding_and_size() {
        let c = square_corners(0.2);
        assert_eq!(c[0], Pt3::new(-0.1, 0.1, 0.0));
        assert_eq!(c[1], Pt3::new(0.1, 0.1, 0.0));
        assert_eq!(c[2], Pt3::new(0.1, -0.1, 0.0));
        assert_eq!(c[3], Pt3::new(-0.1, -0.1, 0.0));
    }
}
