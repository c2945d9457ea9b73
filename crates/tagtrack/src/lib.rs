//! Multi-camera fiducial-marker object localization.
//!
//! This crate turns per-camera marker detections into world poses for a
//! scene of rigid objects:
//! - [`Marker`] and the [`TrackedObject`] kinds describe the scene
//!   (reference boards, top trackers, marker cubes, camera mirrors),
//! - [`ObjectTracker`] owns the registry, localizes cameras against fixed
//!   references and solves mobile objects every frame,
//! - [`fusion`] intersects the sight rays of multiple cameras,
//! - [`snapshot`] is the immutable scene description handed to consumers.
//!
//! Detection itself (finding corner quads in images) happens upstream; this
//! crate starts at [`tagtrack_core::CameraObservations`] and ends at
//! [`ObjectData`].

pub mod fusion;
pub mod marker;
pub mod objects;
pub mod snapshot;
pub mod tracker;

pub use fusion::{intersect_proposals, PoseProposal, DEFAULT_SCORE_DAMPING};
pub use marker::Marker;
pub use objects::{
    solve_pose_default, CubeTracker, ObjectState, SeenMarker, StaticBoard, TopTracker,
    TrackedCamera, TrackedObject, TrackingMode, TranslationFilter, ViewPoseSolution,
};
pub use snapshot::{ObjectData, ObjectKind, Team};
pub use tracker::{ObjectTracker, RegistryError, TrackerOptions};
