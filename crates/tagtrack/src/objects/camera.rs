//! Scene-graph mirrors of physical cameras.

use tagtrack_core::Iso3;

use crate::objects::{ObjectState, TrackedObject, TrackingMode};
use crate::snapshot::{ObjectData, ObjectKind};

/// A marker-less node standing in for one camera.
///
/// The tracker never solves these; after each localization pass the
/// application pushes the camera's `world_from_camera` here so snapshots
/// show where the cameras are. Cameras are also the only objects that come
/// and go at runtime (hot-plugged rigs), so unregistration is legal for
/// them.
pub struct TrackedCamera {
    state: ObjectState,
}

impl TrackedCamera {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: ObjectState::new(name, Iso3::identity()),
        }
    }
}

impl TrackedObject for TrackedCamera {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn tracking_mode(&self) -> TrackingMode {
        TrackingMode::AdjustableReference
    }

    fn to_object_data(&self) -> Vec<ObjectData> {
        let mut data = ObjectData::new(ObjectKind::Camera, self.state.name.clone(), self.pose());
        data.last_seen = self.last_seen();
        vec![data]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tagtrack_core::Vec3;

    #[test]
    fn camera_mirrors_accept_raw_poses() {
        let cam = TrackedCamera::new("cam_left");
        let pose = Iso3::new(Vec3::new(1.0, -0.5, 2.0), Vec3::new(0.0, 1.1, 0.0));
        assert!(cam.set_pose(&pose, 7));
        assert_relative_eq!(cam.pose().translation.vector, pose.translation.vector);
        assert_eq!(cam.last_seen(), Some(7));
        assert!(cam.should_display(u64::MAX - 1));

        let data = cam.to_object_data();
        assert_eq!(data[0].kind, ObjectKind::Camera);
        assert_eq!(data[0].name, "cam_left");
    }
}
