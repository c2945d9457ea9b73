//! Closed-form marker pose solvers and non-linear refinement.
//!
//! Three entry points cover the marker configurations the tracker meets:
//! - [`solve_square`] for a single square marker (4 coplanar points),
//! - [`solve_planar`] for several markers sharing the object's Z = 0 plane,
//! - [`solve_epnp`] for general non-coplanar marker sets.
//!
//! All of them return the lens-from-object transform. [`refine_pose`] then
//! polishes any of these estimates by minimizing pixel reprojection error.

mod epnp;
mod error;
mod homography;
mod planar;
mod refine;
mod reproject;

pub use epnp::solve_epnp;
pub use error::SolveError;
pub use homography::dlt_homography;
pub use planar::{solve_planar, solve_square};
pub use refine::{refine_pose, RefineOptions, RefineReport};
pub use reproject::{project_points, project_quad, reprojection_error};
