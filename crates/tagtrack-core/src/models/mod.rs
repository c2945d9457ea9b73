//! Camera model: pinhole intrinsics plus Brown-Conrady distortion.
//!
//! Projection pipeline: `pixel = K ∘ distortion ∘ perspective(p_camera)`.
//! The inverse direction (`normalize_pixel`, `backproject_pixel`) undistorts
//! and removes K, yielding normalized image coordinates or a unit ray in the
//! camera frame.

mod camera;
mod distortion;
mod intrinsics;

pub use camera::CameraModel;
pub use distortion::Distortion;
pub use intrinsics::Intrinsics;
