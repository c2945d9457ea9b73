//! Planar reference boards.

use tagtrack_core::{Iso3, Pt3, Real};

use crate::marker::Marker;
use crate::objects::{ObjectState, TrackedObject, TrackingMode};
use crate::snapshot::{ObjectData, ObjectKind};

/// A flat board carrying one or more markers at surveyed positions.
///
/// Boards are the anchors of the scene: cameras localize themselves by
/// solving a board they can see and inverting the result. A fixed board's
/// pose never changes after construction; an adjustable board accepts
/// runtime corrections (a plate whose exact placement is measured on site).
pub struct StaticBoard {
    state: ObjectState,
    adjustable: bool,
}

impl StaticBoard {
    /// A reference fixed at a surveyed world pose.
    pub fn fixed(name: impl Into<String>, world_from_board: Iso3, markers: Vec<Marker>) -> Self {
        let mut state = ObjectState::new(name, world_from_board);
        state.markers = markers;
        Self {
            state,
            adjustable: false,
        }
    }

    /// A reference whose placement may be corrected at runtime.
    pub fn adjustable(
        name: impl Into<String>,
        world_from_board: Iso3,
        markers: Vec<Marker>,
    ) -> Self {
        let mut board = Self::fixed(name, world_from_board, markers);
        board.adjustable = true;
        board
    }

    /// The four-corner field plate: one face-up marker per quadrant at
    /// `(±half_x, ±half_y)`, IDs in quadrant order `(+,+)`, `(-,+)`,
    /// `(-,-)`, `(+,-)`.
    pub fn corner_layout(
        name: impl Into<String>,
        world_from_board: Iso3,
        half_x: Real,
        half_y: Real,
        side: Real,
        ids: [u32; 4],
    ) -> Self {
        let offsets = [
            (half_x, half_y),
            (-half_x, half_y),
            (-half_x, -half_y),
            (half_x, -half_y),
        ];
        let markers = ids
            .iter()
            .zip(offsets)
            .map(|(&id, (x, y))| Marker::new(side, id, Iso3::translation(x, y, 0.0)))
            .collect();
        Self::fixed(name, world_from_board, markers)
    }
}

impl TrackedObject for StaticBoard {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn tracking_mode(&self) -> TrackingMode {
        if self.adjustable {
            TrackingMode::AdjustableReference
        } else {
            TrackingMode::FixedReference
        }
    }

    fn to_object_data(&self) -> Vec<ObjectData> {
        let kind = if self.adjustable {
            ObjectKind::ReferenceRelative
        } else {
            ObjectKind::ReferenceAbsolute
        };
        let mut data = ObjectData::new(kind, self.state.name.clone(), self.pose());
        data.last_seen = self.last_seen();
        data.children = self.state.markers_and_children();
        vec![data]
    }

    /// World-space marker quads, for detectors that support focused
    /// re-scanning of known regions.
    fn points_of_interest(&self) -> Vec<Vec<Pt3>> {
        let world_from_board = self.pose();
        self.state
            .markers
            .iter()
            .map(|m| m.corners_in(&world_from_board).to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tagtrack_core::Vec3;

    #[test]
    fn corner_layout_places_one_marker_per_quadrant() {
        let board = StaticBoard::corner_layout(
            "field",
            Iso3::identity(),
            1.0,
            0.7,
            0.1,
            [20, 21, 22, 23],
        );
        let m = &board.state().markers;
        assert_eq!(m.len(), 4);
        assert_relative_eq!(m[0].object_from_marker.translation.vector, Vec3::new(1.0, 0.7, 0.0));
        assert_relative_eq!(m[1].object_from_marker.translation.vector, Vec3::new(-1.0, 0.7, 0.0));
        assert_relative_eq!(m[2].object_from_marker.translation.vector, Vec3::new(-1.0, -0.7, 0.0));
        assert_relative_eq!(m[3].object_from_marker.translation.vector, Vec3::new(1.0, -0.7, 0.0));
        assert_eq!(m[1].id, 21);
    }

    #[test]
    fn fixed_boards_pin_their_pose() {
        let pose = Iso3::translation(0.5, 0.0, 0.0);
        let board = StaticBoard::corner_layout("field", pose, 1.0, 0.7, 0.1, [0, 1, 2, 3]);
        assert_eq!(board.tracking_mode(), TrackingMode::FixedReference);
        assert!(!board.set_pose(&Iso3::identity(), 10));
        assert_relative_eq!(board.pose().translation.vector, pose.translation.vector);
        assert!(board.should_display(u64::MAX - 1));
    }

    #[test]
    fn adjustable_boards_accept_corrections() {
        let board = StaticBoard::adjustable("plate", Iso3::identity(), vec![]);
        assert_eq!(board.tracking_mode(), TrackingMode::AdjustableReference);
        let corrected = Iso3::translation(0.01, -0.02, 0.0);
        assert!(board.set_pose(&corrected, 10));
        assert_relative_eq!(board.pose().translation.vector, corrected.translation.vector);
    }

    #[test]
    fn snapshot_entry_nests_markers() {
        let board = StaticBoard::corner_layout(
            "field",
            Iso3::identity(),
            1.0,
            0.7,
            0.1,
            [20, 21, 22, 23],
        );
        let data = board.to_object_data();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].kind, ObjectKind::ReferenceAbsolute);
        assert_eq!(data[0].children.len(), 4);
        assert_eq!(data[0].children[0].name, "tag_20");
    }

    #[test]
    fn points_of_interest_are_world_space_quads() {
        let board = StaticBoard::corner_layout(
            "field",
            Iso3::translation(0.0, 0.0, 0.2),
            1.0,
            0.7,
            0.1,
            [0, 1, 2, 3],
        );
        let poi = board.points_of_interest();
        assert_eq!(poi.len(), 4);
        assert_eq!(poi[0].len(), 4);
        // First marker sits at (1.0, 0.7) on a board raised 0.2 m.
        assert_relative_eq!(poi[0][0], Pt3::new(0.95, 0.75, 0.2), epsilon = 1e-12);
    }
}
