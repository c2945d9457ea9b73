//! Object registry and the per-frame solve passes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tagtrack_core::{CameraObservations, Iso3, Pt3, Real, Tick, MARKER_DICT_SIZE};

use crate::fusion::{intersect_proposals, PoseProposal};
use crate::objects::{ObjectState, TrackedObject, TrackingMode, ViewPoseSolution};
use crate::snapshot::ObjectData;

/// Tunable tracker policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerOptions {
    /// Minimum score for a per-view proposal to count.
    pub min_score: Real,
    /// Damping in the score denominator.
    pub score_damping: Real,
    /// Side length assumed for marker IDs nobody registered, in meters.
    pub default_marker_size: Real,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            score_damping: 0.1,
            default_marker_size: 0.05,
        }
    }
}

/// Registration failures. All of these mean the scene description itself is
/// inconsistent, so callers normally treat them as fatal configuration
/// errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("marker id {0} is outside the dictionary (size {size})", size = MARKER_DICT_SIZE)]
    MarkerIdOutOfRange(u32),
    #[error("marker {id} has non-positive side length {side}")]
    BadSideLength { id: u32, side: Real },
    #[error("marker {id} is already owned by '{owner}'")]
    MarkerAlreadyOwned { id: u32, owner: String },
    #[error("object '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("object '{0}' still carries markers or children")]
    ObjectNotEmpty(String),
    #[error("object '{0}' is not registered")]
    NotRegistered(String),
}

/// Registry of tracked objects plus the passes run on every frame.
///
/// Ownership of marker IDs is resolved at registration into dense per-ID
/// maps, so matching detections to objects during a solve is a plain array
/// lookup away and can never conflict mid-match.
pub struct ObjectTracker {
    options: TrackerOptions,
    objects: Vec<Arc<dyn TrackedObject>>,
    marker_owner: [Option<usize>; MARKER_DICT_SIZE],
    marker_sizes: [Real; MARKER_DICT_SIZE],
}

impl Default for ObjectTracker {
    fn default() -> Self {
        Self::new(TrackerOptions::default())
    }
}

impl ObjectTracker {
    pub fn new(options: TrackerOptions) -> Self {
        let default_size = options.default_marker_size;
        Self {
            options,
            objects: Vec::new(),
            marker_owner: [None; MARKER_DICT_SIZE],
            marker_sizes: [default_size; MARKER_DICT_SIZE],
        }
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    /// Registered objects, in registration order.
    pub fn objects(&self) -> &[Arc<dyn TrackedObject>] {
        &self.objects
    }

    /// Add an object to the scene.
    ///
    /// Two phases: the object's marker tree (children included) is fully
    /// validated first, then ownership is committed, so a rejected object
    /// leaves no trace in the registry.
    pub fn register_object(
        &mut self,
        object: &Arc<dyn TrackedObject>,
    ) -> Result<(), RegistryError> {
        let name = &object.state().name;
        if self.objects.iter().any(|o| Arc::ptr_eq(o, object)) {
            log::warn!("rejecting '{}': already registered", name);
            return Err(RegistryError::AlreadyRegistered(name.clone()));
        }

        let mut claims = Vec::new();
        if let Err(err) = self.collect_claims(object.state(), &mut claims) {
            log::warn!("rejecting '{}': {}", name, err);
            return Err(err);
        }

        let index = self.objects.len();
        self.objects.push(object.clone());
        for (id, side) in claims {
            self.marker_owner[id as usize] = Some(index);
            self.marker_sizes[id as usize] = side;
        }
        Ok(())
    }

    /// Remove an object from the scene.
    ///
    /// Only marker-less, child-less objects (camera mirrors) may leave;
    /// anything else would orphan marker ownership mid-season.
    pub fn unregister_object(
        &mut self,
        object: &Arc<dyn TrackedObject>,
    ) -> Result<(), RegistryError> {
        let state = object.state();
        if !state.markers.is_empty() || !state.children.is_empty() {
            return Err(RegistryError::ObjectNotEmpty(state.name.clone()));
        }
        let Some(index) = self.objects.iter().position(|o| Arc::ptr_eq(o, object)) else {
            return Err(RegistryError::NotRegistered(state.name.clone()));
        };
        self.objects.remove(index);
        self.rebuild_marker_maps();
        Ok(())
    }

    /// Walk one object's marker tree, validating each marker against the
    /// dictionary and current ownership.
    fn collect_claims(
        &self,
        state: &ObjectState,
        claims: &mut Vec<(u32, Real)>,
    ) -> Result<(), RegistryError> {
        for marker in &state.markers {
            let id = marker.id;
            if id as usize >= MARKER_DICT_SIZE {
                return Err(RegistryError::MarkerIdOutOfRange(id));
            }
            if marker.side_length <= 0.0 {
                return Err(RegistryError::BadSideLength {
                    id,
                    side: marker.side_length,
                });
            }
            if let Some(owner) = self.marker_owner[id as usize] {
                return Err(RegistryError::MarkerAlreadyOwned {
                    id,
                    owner: self.objects[owner].state().name.clone(),
                });
            }
            if claims.iter().any(|(claimed, _)| *claimed == id) {
                return Err(RegistryError::MarkerAlreadyOwned {
                    id,
                    owner: state.name.clone(),
                });
            }
            claims.push((id, marker.side_length));
        }
        for child in &state.children {
            self.collect_claims(child.state(), claims)?;
        }
        Ok(())
    }

    /// Indices shift when an object leaves, so the maps are rebuilt from
    /// scratch. Registered trees were validated, the walk cannot fail.
    fn rebuild_marker_maps(&mut self) {
        self.marker_owner = [None; MARKER_DICT_SIZE];
        self.marker_sizes = [self.options.default_marker_size; MARKER_DICT_SIZE];
        let mut claims = Vec::new();
        for index in 0..self.objects.len() {
            claims.clear();
            let object = self.objects[index].clone();
            if self.collect_claims(object.state(), &mut claims).is_ok() {
                for &(id, side) in &claims {
                    self.marker_owner[id as usize] = Some(index);
                    self.marker_sizes[id as usize] = side;
                }
            }
        }
    }

    /// The object owning a marker ID, if any.
    pub fn marker_owner(&self, id: u32) -> Option<&Arc<dyn TrackedObject>> {
        self.marker_owner
            .get(id as usize)
            .copied()
            .flatten()
            .map(|index| &self.objects[index])
    }

    /// Physical side length assumed for a marker ID.
    pub fn marker_size(&self, id: u32) -> Real {
        self.marker_sizes
            .get(id as usize)
            .copied()
            .unwrap_or(self.options.default_marker_size)
    }

    /// Override the side length for an unowned marker ID (markers detected
    /// in the wild without a registered carrier).
    pub fn set_marker_size(&mut self, id: u32, side: Real) {
        if id as usize >= MARKER_DICT_SIZE || side <= 0.0 {
            log::debug!("ignoring marker size override ({}, {})", id, side);
            return;
        }
        self.marker_sizes[id as usize] = side;
    }

    /// Localize one camera from the fixed references it can see.
    ///
    /// Every fixed reference is solved against the observations; the one
    /// with the largest supporting surface wins and its inverse becomes the
    /// camera's world pose. Reprojected corners are written back for every
    /// reference that produced a finite solution. Returns `false` when no
    /// reference was usable, leaving the previous camera pose untouched.
    pub fn solve_camera_pose(&self, obs: &mut CameraObservations) -> bool {
        let mut best: Option<(Real, Iso3)> = None;
        for object in &self.objects {
            if object.tracking_mode() != TrackingMode::FixedReference {
                continue;
            }
            let solution = object.solve_pose_from_view(obs);
            if !solution.is_solved() {
                continue;
            }
            apply_feedback(obs, &solution);
            let world_from_camera = object.pose() * solution.camera_from_object.inverse();
            if best.as_ref().map_or(true, |(surface, _)| solution.surface > *surface) {
                best = Some((solution.surface, world_from_camera));
            }
        }
        match best {
            Some((_, world_from_camera)) => {
                obs.world_from_camera = world_from_camera;
                true
            }
            None => {
                log::debug!("camera '{}' saw no usable fixed reference", obs.name);
                false
            }
        }
    }

    /// Solve every mobile object against every camera and fuse the results.
    ///
    /// Per object: each camera contributes one scored proposal; proposals
    /// under `min_score` are dropped; a single survivor is adopted directly
    /// and two or more go through ray fusion. Solved poses are stored via
    /// each object's `set_pose` (translation smoothing applies) stamped with
    /// `tick`. Reprojected corners are written back for every camera that
    /// produced a finite solution, scored or not.
    pub fn solve_object_poses(&self, observations: &mut [CameraObservations], tick: Tick) {
        for object in &self.objects {
            if object.tracking_mode() != TrackingMode::Mobile {
                continue;
            }
            let mut proposals = Vec::new();
            for obs in observations.iter_mut() {
                let solution = object.solve_pose_from_view(obs);
                if !solution.is_solved() {
                    continue;
                }
                apply_feedback(obs, &solution);
                let score = solution.score(self.options.score_damping);
                if score < self.options.min_score {
                    log::debug!(
                        "'{}' via '{}' scored {:.3}, below {:.3}",
                        object.state().name,
                        obs.name,
                        score,
                        self.options.min_score
                    );
                    continue;
                }
                proposals.push(PoseProposal {
                    score,
                    world_from_object: obs.world_from_camera * solution.camera_from_object,
                    world_from_camera: obs.world_from_camera,
                });
            }
            if let Some(pose) = intersect_proposals(&proposals) {
                object.set_pose(&pose, tick);
            }
        }
    }

    /// Immutable scene description at `tick`, in registration order.
    ///
    /// Mobile objects not seen within the display window are filtered out;
    /// tick 0 bypasses the filter and reports everything.
    pub fn snapshot(&self, tick: Tick) -> Vec<ObjectData> {
        self.objects
            .iter()
            .filter(|o| tick == 0 || o.should_display(tick))
            .flat_map(|o| o.to_object_data())
            .collect()
    }

    /// World-space regions worth re-scanning, aggregated over all objects.
    pub fn points_of_interest(&self) -> Vec<Vec<Pt3>> {
        self.objects
            .iter()
            .flat_map(|o| o.points_of_interest())
            .collect()
    }
}

fn apply_feedback(obs: &mut CameraObservations, solution: &ViewPoseSolution) {
    for &(lens, detection, corners) in &solution.reprojected {
        if let Some(l) = obs.lenses.get_mut(lens) {
            l.set_reprojected(detection, corners);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Marker;
    use crate::objects::{StaticBoard, TopTracker, TrackedCamera};

    fn board() -> Arc<dyn TrackedObject> {
        Arc::new(StaticBoard::corner_layout(
            "field",
            Iso3::identity(),
            1.0,
            0.7,
            0.1,
            [20, 21, 22, 23],
        ))
    }

    #[test]
    fn duplicate_marker_ownership_is_fatal() {
        let mut tracker = ObjectTracker::default();
        tracker.register_object(&board()).unwrap();

        let clash: Arc<dyn TrackedObject> = Arc::new(TopTracker::new("intruder", 21, 0.05, 0.3));
        assert_eq!(
            tracker.register_object(&clash),
            Err(RegistryError::MarkerAlreadyOwned {
                id: 21,
                owner: "field".into(),
            })
        );
        // The rejected object left no trace.
        assert_eq!(tracker.objects().len(), 1);
        assert!(tracker.marker_owner(21).is_some());
    }

    #[test]
    fn registration_validates_the_whole_tree_first() {
        let mut tracker = ObjectTracker::default();

        let bad: Arc<dyn TrackedObject> = Arc::new(StaticBoard::fixed(
            "bad",
            Iso3::identity(),
            vec![
                Marker::at_origin(0.1, 5),
                Marker::at_origin(0.1, 500), // out of dictionary
            ],
        ));
        assert_eq!(
            tracker.register_object(&bad),
            Err(RegistryError::MarkerIdOutOfRange(500))
        );
        // The valid first marker must not have been committed.
        assert!(tracker.marker_owner(5).is_none());

        let negative: Arc<dyn TrackedObject> = Arc::new(StaticBoard::fixed(
            "negative",
            Iso3::identity(),
            vec![Marker::at_origin(-0.1, 6)],
        ));
        assert!(matches!(
            tracker.register_object(&negative),
            Err(RegistryError::BadSideLength { id: 6, .. })
        ));
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut tracker = ObjectTracker::default();
        let b = board();
        tracker.register_object(&b).unwrap();
        assert_eq!(
            tracker.register_object(&b),
            Err(RegistryError::AlreadyRegistered("field".into()))
        );
    }

    #[test]
    fn unregistration_is_for_empty_objects_only() {
        let mut tracker = ObjectTracker::default();
        let b = board();
        let cam: Arc<dyn TrackedObject> = Arc::new(TrackedCamera::new("cam0"));
        tracker.register_object(&b).unwrap();
        tracker.register_object(&cam).unwrap();

        assert_eq!(
            tracker.unregister_object(&b),
            Err(RegistryError::ObjectNotEmpty("field".into()))
        );

        let stranger: Arc<dyn TrackedObject> = Arc::new(TrackedCamera::new("ghost"));
        assert_eq!(
            tracker.unregister_object(&stranger),
            Err(RegistryError::NotRegistered("ghost".into()))
        );

        tracker.unregister_object(&cam).unwrap();
        assert_eq!(tracker.objects().len(), 1);
        // Marker ownership survives the rebuild.
        assert!(tracker.marker_owner(20).is_some());
        assert_eq!(tracker.marker_owner(20).unwrap().state().name, "field");
    }

    #[test]
    fn marker_sizes_default_and_override() {
        let mut tracker = ObjectTracker::default();
        assert_eq!(tracker.marker_size(42), 0.05);

        tracker.set_marker_size(42, 0.12);
        assert_eq!(tracker.marker_size(42), 0.12);

        // Nonsense overrides are ignored.
        tracker.set_marker_size(42, -1.0);
        assert_eq!(tracker.marker_size(42), 0.12);
        tracker.set_marker_size(9999, 0.2);
        assert_eq!(tracker.marker_size(9999), 0.05);

        // Registration records the owned marker's size.
        tracker.register_object(&board()).unwrap();
        assert_eq!(tracker.marker_size(20), 0.1);
    }
}
