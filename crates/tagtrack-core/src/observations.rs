//! Per-camera marker observations for one frame.
//!
//! This is the handoff format between a 2D marker detector and the tracking
//! pipeline: for every lens of a camera, the calibration of that lens and
//! the list of detected marker corner quads. The pipeline writes reprojected
//! corners back into the same structure so detector front-ends can display
//! or gate on them.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::math::{quad_area, Iso3, Pt2, Real};
use crate::models::CameraModel;

/// One detected marker: dictionary ID plus four corner pixels in detector
/// winding order (top-left, top-right, bottom-right, bottom-left).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: u32,
    pub corners: [Pt2; 4],
}

impl MarkerDetection {
    /// Projected surface of the detection in squared pixels.
    pub fn area(&self) -> Real {
        quad_area(&self.corners)
    }
}

/// Detections seen by a single lens, together with that lens's calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LensObservations {
    pub camera: CameraModel,
    /// Lens mount pose in the camera body frame. Identity for mono cameras.
    pub camera_from_lens: Iso3,
    pub detections: Vec<MarkerDetection>,
    /// Reprojected corners written back by the tracker, parallel to
    /// `detections`. `None` where nothing was solved against the detection.
    #[serde(default)]
    pub reprojected: Vec<Option<[Pt2; 4]>>,
}

impl LensObservations {
    pub fn new(
        camera: CameraModel,
        camera_from_lens: Iso3,
        detections: Vec<MarkerDetection>,
    ) -> Self {
        let reprojected = vec![None; detections.len()];
        Self {
            camera,
            camera_from_lens,
            detections,
            reprojected,
        }
    }

    /// Record solver feedback for one detection.
    ///
    /// Deserialized observation sets may arrive without the parallel
    /// feedback list; it is sized on first use.
    pub fn set_reprojected(&mut self, index: usize, corners: [Pt2; 4]) {
        if self.reprojected.len() != self.detections.len() {
            self.reprojected.resize(self.detections.len(), None);
        }
        if index < self.reprojected.len() {
            self.reprojected[index] = Some(corners);
        }
    }
}

/// Everything one camera contributes in one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraObservations {
    pub name: String,
    /// Camera body pose in the world frame: best effort until a reference
    /// sighting resolves it, then kept up to date by the tracker.
    pub world_from_camera: Iso3,
    pub lenses: Vec<LensObservations>,
}

impl CameraObservations {
    /// A camera must carry at least one lens.
    pub fn new(
        name: impl Into<String>,
        world_from_camera: Iso3,
        lenses: Vec<LensObservations>,
    ) -> Result<Self> {
        let name = name.into();
        ensure!(
            !lenses.is_empty(),
            "camera '{}' needs at least one lens",
            name
        );
        Ok(Self {
            name,
            world_from_camera,
            lenses,
        })
    }

    /// Convenience constructor for the common single-lens case.
    pub fn mono(
        name: impl Into<String>,
        camera: CameraModel,
        detections: Vec<MarkerDetection>,
    ) -> Self {
        Self {
            name: name.into(),
            world_from_camera: Iso3::identity(),
            lenses: vec![LensObservations::new(camera, Iso3::identity(), detections)],
        }
    }

    /// World pose of one lens, derived from the camera body pose.
    pub fn world_from_lens(&self, lens: usize) -> Option<Iso3> {
        self.lenses
            .get(lens)
            .map(|l| self.world_from_camera * l.camera_from_lens)
    }
}
