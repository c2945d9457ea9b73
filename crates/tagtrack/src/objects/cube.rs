//! Cube-shaped trackers with a marker on each vertical face.

use nalgebra::{Translation3, UnitQuaternion};
use tagtrack_core::{rotation_from_zy, Iso3, Real, Vec3};

use crate::marker::Marker;
use crate::objects::{ObjectState, TrackedObject};
use crate::snapshot::{ObjectData, ObjectKind};

/// A cube mounted on a robot mast, one marker per vertical face.
///
/// Whatever the robot's heading, at least one face looks toward any camera
/// above the field; two faces at once give the solver a non-coplanar point
/// set and a much stronger pose. The object origin is the ground-contact
/// point below the cube's axis; faces are centered at `center_height` and
/// look outward along +X, +Y, -X, -Y (IDs in that order), with the printed
/// tags upright.
pub struct CubeTracker {
    state: ObjectState,
}

impl CubeTracker {
    pub fn new(
        name: impl Into<String>,
        ids: [u32; 4],
        marker_side: Real,
        half_width: Real,
        center_height: Real,
    ) -> Self {
        let outward = [Vec3::x(), Vec3::y(), -Vec3::x(), -Vec3::y()];
        let markers = ids
            .iter()
            .zip(outward)
            .map(|(&id, normal)| {
                let rot = rotation_from_zy(&normal, &Vec3::z());
                let center = normal * half_width + Vec3::new(0.0, 0.0, center_height);
                Marker::new(
                    marker_side,
                    id,
                    Iso3::from_parts(
                        Translation3::from(center),
                        UnitQuaternion::from_rotation_matrix(&rot),
                    ),
                )
            })
            .collect();

        let mut state = ObjectState::new(name, Iso3::identity());
        state.markers = markers;
        state.coplanar_tags = false;
        Self { state }
    }
}

impl TrackedObject for CubeTracker {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn to_object_data(&self) -> Vec<ObjectData> {
        let mut data = ObjectData::new(ObjectKind::Robot, self.state.name.clone(), self.pose());
        data.last_seen = self.last_seen();
        data.children = self.state.markers_and_children();
        vec![data]
    }
}
