//! Objects tracked through a single top-mounted marker.

use tagtrack_core::{CameraObservations, Iso3, Pt3, Real, Vec3};

use crate::marker::Marker;
use crate::objects::{solve_pose_default, ObjectState, TrackedObject, ViewPoseSolution};
use crate::snapshot::{ObjectData, ObjectKind};

/// Minimum alignment between the solved top normal and world up. Single
/// near-frontal squares can solve to a flipped pose; anything tilted past
/// this is discarded.
const UPRIGHT_DOT_MIN: Real = 0.8;

/// A mobile object carrying one marker flat on its top at a known height.
///
/// The horizontal-top prior does two jobs: badly tilted per-view solutions
/// are discarded outright, and the expected top plane around the last
/// sighting is advertised as a region of interest for focused re-detection.
pub struct TopTracker {
    state: ObjectState,
    expected_height: Real,
    kind: ObjectKind,
}

impl TopTracker {
    pub fn new(
        name: impl Into<String>,
        marker_id: u32,
        marker_side: Real,
        expected_height: Real,
    ) -> Self {
        let mut state = ObjectState::new(name, Iso3::identity());
        state.markers = vec![Marker::new(
            marker_side,
            marker_id,
            Iso3::translation(0.0, 0.0, expected_height),
        )];
        Self {
            state,
            expected_height,
            kind: ObjectKind::TopTracker,
        }
    }

    /// A robot-mounted top tracker; identical geometry, reported as a robot.
    pub fn robot(
        name: impl Into<String>,
        marker_id: u32,
        marker_side: Real,
        expected_height: Real,
    ) -> Self {
        let mut tracker = Self::new(name, marker_id, marker_side, expected_height);
        tracker.kind = ObjectKind::Robot;
        tracker
    }

    pub fn expected_height(&self) -> Real {
        self.expected_height
    }
}

impl TrackedObject for TopTracker {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn to_object_data(&self) -> Vec<ObjectData> {
        let mut data = ObjectData::new(self.kind, self.state.name.clone(), self.pose());
        data.last_seen = self.last_seen();
        data.metadata = Some(serde_json::json!({
            "expected_height": self.expected_height,
        }));
        data.children = self.state.markers_and_children();
        vec![data]
    }

    fn solve_pose_from_view(&self, obs: &CameraObservations) -> ViewPoseSolution {
        let solution = solve_pose_default(self, obs);
        if !solution.is_solved() {
            return solution;
        }
        let world_from_object = obs.world_from_camera * solution.camera_from_object;
        let up = world_from_object.rotation * Vec3::z();
        if up.z < UPRIGHT_DOT_MIN {
            log::debug!(
                "{}: discarding tilted solution (up.z = {:.3})",
                self.state.name,
                up.z
            );
            return ViewPoseSolution::unsolved();
        }
        solution
    }

    /// The expected top plane around the last known position.
    fn points_of_interest(&self) -> Vec<Vec<Pt3>> {
        let Some(marker) = self.state.markers.first() else {
            return Vec::new();
        };
        let center = self.pose().translation.vector;
        let h = marker.side_length;
        let z = self.expected_height;
        vec![vec![
            Pt3::new(center.x - h, center.y + h, z),
            Pt3::new(center.x + h, center.y + h, z),
            Pt3::new(center.x + h, center.y - h, z),
            Pt3::new(center.x - h, center.y - h, z),
        ]]
    }
}
