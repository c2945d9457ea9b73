//! Tracked-object model.
//!
//! Every entity the tracker manages (reference boards, robot trackers,
//! cameras) implements [`TrackedObject`]: a shared [`ObjectState`] node plus
//! a handful of overridable behaviors. The default implementations cover the
//! common case; concrete kinds override only what their geometry demands
//! (see [`TopTracker`]).

mod board;
mod camera;
mod cube;
mod filter;
mod top_tracker;

pub use board::StaticBoard;
pub use camera::TrackedCamera;
pub use cube::CubeTracker;
pub use filter::TranslationFilter;
pub use top_tracker::TopTracker;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use nalgebra::Translation3;
use tagtrack_core::{
    quad_area, seconds_between, CameraObservations, Iso3, LensObservations, Pt2, Pt3, Real, Tick,
    DISPLAY_WINDOW, FORCE_POSE,
};
use tagtrack_solve::{
    project_quad, refine_pose, reprojection_error, solve_epnp, solve_planar, solve_square,
    RefineOptions,
};

use crate::fusion::DEFAULT_SCORE_DAMPING;
use crate::marker::Marker;
use crate::snapshot::ObjectData;

/// How an object's pose participates in tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Pose surveyed once and pinned; anchors camera localization.
    FixedReference,
    /// Pose set by the application (corrected references, camera mirrors),
    /// never solved from markers.
    AdjustableReference,
    /// Pose solved from marker sightings every frame.
    Mobile,
}

/// One marker sighting matched to an object, carrying everything the pose
/// solver needs expressed in the frame of the object being solved.
#[derive(Debug, Clone)]
pub struct SeenMarker {
    pub id: u32,
    /// Lens index within the camera's observations.
    pub lens: usize,
    /// Detection index within that lens.
    pub detection: usize,
    pub side_length: Real,
    pub image_corners: [Pt2; 4],
    /// Marker corners in the solved object's frame.
    pub object_corners: [Pt3; 4],
    /// Solved-object-from-marker transform, children's mounts folded in.
    pub object_from_marker: Iso3,
}

/// Outcome of solving one object against one camera's observations.
#[derive(Debug, Clone)]
pub struct ViewPoseSolution {
    /// Object pose in the camera body frame (lens mount folded in).
    pub camera_from_object: Iso3,
    /// Summed pixel area of the supporting detections.
    pub surface: Real,
    /// Mean reprojection error per supporting marker, in pixels.
    pub reprojection_error: Real,
    /// Reprojected corners to hand back to the detector:
    /// `(lens, detection, corners)`.
    pub reprojected: Vec<(usize, usize, [Pt2; 4])>,
}

impl ViewPoseSolution {
    /// The failure value: no surface, infinite error. Scores zero, so it
    /// never survives proposal filtering.
    pub fn unsolved() -> Self {
        Self {
            camera_from_object: Iso3::identity(),
            surface: 0.0,
            reprojection_error: Real::INFINITY,
            reprojected: Vec::new(),
        }
    }

    pub fn is_solved(&self) -> bool {
        self.surface > 0.0 && self.reprojection_error.is_finite()
    }

    /// Confidence score: large, well-fitting detections score high.
    /// `damping` keeps near-zero reprojection errors from dominating.
    pub fn score(&self, damping: Real) -> Real {
        if !self.is_solved() {
            return 0.0;
        }
        self.surface / (self.reprojection_error + damping)
    }
}

#[derive(Debug)]
struct PoseTrack {
    pose: Iso3,
    last_seen: Option<Tick>,
    filter: TranslationFilter,
}

/// Shared node payload every tracked object carries.
///
/// The pose track sits behind a lock so solve passes can update objects
/// while snapshot readers run; everything else is fixed at construction.
pub struct ObjectState {
    pub name: String,
    pub markers: Vec<Marker>,
    pub children: Vec<Arc<dyn TrackedObject>>,
    /// At most one instance of this object exists on the field. Carried as
    /// descriptive data for snapshot consumers.
    pub unique: bool,
    /// All markers, children's included, lie in this object's Z = 0 plane.
    /// Enables the better-conditioned planar solve for multi-marker views.
    pub coplanar_tags: bool,
    track: RwLock<PoseTrack>,
}

impl ObjectState {
    /// A node with no markers or children yet. `pose` is relative to the
    /// parent object; top-level objects' parent is the world.
    pub fn new(name: impl Into<String>, pose: Iso3) -> Self {
        Self {
            name: name.into(),
            markers: Vec::new(),
            children: Vec::new(),
            unique: true,
            coplanar_tags: true,
            track: RwLock::new(PoseTrack {
                pose,
                last_seen: None,
                filter: TranslationFilter::default(),
            }),
        }
    }

    fn read_track(&self) -> RwLockReadGuard<'_, PoseTrack> {
        self.track.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_track(&self) -> RwLockWriteGuard<'_, PoseTrack> {
        self.track.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current pose in the parent frame.
    pub fn pose(&self) -> Iso3 {
        self.read_track().pose
    }

    pub fn last_seen(&self) -> Option<Tick> {
        self.read_track().last_seen
    }

    /// Store a pose with translation smoothing. The [`FORCE_POSE`] tick
    /// bypasses the filter, reseeds it at the forced position and marks the
    /// object as seen from then on.
    pub fn set_pose_filtered(&self, pose: &Iso3, tick: Tick) {
        let mut track = self.write_track();
        if tick == FORCE_POSE {
            track.filter.reset();
            track.filter.update(pose.translation.vector, 0.0);
            track.pose = *pose;
            track.last_seen = Some(FORCE_POSE);
            return;
        }
        let dt = match track.last_seen {
            Some(last) => seconds_between(last, tick),
            None => 0.0,
        };
        let smoothed = track.filter.update(pose.translation.vector, dt);
        track.pose = Iso3::from_parts(Translation3::from(smoothed), pose.rotation);
        track.last_seen = Some(tick);
    }

    /// Store a pose verbatim (reference corrections, camera mirrors).
    pub fn set_pose_raw(&self, pose: &Iso3, tick: Tick) {
        let mut track = self.write_track();
        track.filter.reset();
        track.pose = *pose;
        track.last_seen = Some(tick);
    }

    /// Whether the object was seen within the display window before `tick`.
    /// Force-set objects count as always seen.
    pub fn recently_seen(&self, tick: Tick) -> bool {
        match self.read_track().last_seen {
            Some(last) => tick.saturating_sub(last) <= DISPLAY_WINDOW,
            None => false,
        }
    }

    /// Snapshot entries for this node's markers and child objects, with
    /// poses relative to this node.
    pub fn markers_and_children(&self) -> Vec<ObjectData> {
        let mut out: Vec<ObjectData> = self.markers.iter().map(ObjectData::marker).collect();
        for child in &self.children {
            out.extend(child.to_object_data());
        }
        out
    }
}

/// Capability interface shared by everything the tracker manages.
///
/// Implementors supply [`ObjectState`] plus a snapshot conversion; provided
/// methods cover pose bookkeeping, marker lookup and the per-view solve.
pub trait TrackedObject: Send + Sync {
    /// Shared node state.
    fn state(&self) -> &ObjectState;

    /// Snapshot entries for this object. Most kinds produce exactly one;
    /// poses of nested entries are relative to their parent entry.
    fn to_object_data(&self) -> Vec<ObjectData>;

    fn tracking_mode(&self) -> TrackingMode {
        TrackingMode::Mobile
    }

    /// Current pose in the parent frame (the world frame for registered
    /// top-level objects).
    fn pose(&self) -> Iso3 {
        self.state().pose()
    }

    fn last_seen(&self) -> Option<Tick> {
        self.state().last_seen()
    }

    /// Accept a solved pose. Returns `false` when the object refuses the
    /// update, which fixed references do.
    fn set_pose(&self, pose: &Iso3, tick: Tick) -> bool {
        match self.tracking_mode() {
            TrackingMode::FixedReference => false,
            TrackingMode::AdjustableReference => {
                self.state().set_pose_raw(pose, tick);
                true
            }
            TrackingMode::Mobile => {
                self.state().set_pose_filtered(pose, tick);
                true
            }
        }
    }

    /// Whether a snapshot at `tick` should include this object. References
    /// always display; mobile objects go stale after the display window.
    fn should_display(&self, tick: Tick) -> bool {
        match self.tracking_mode() {
            TrackingMode::Mobile => self.state().recently_seen(tick),
            _ => true,
        }
    }

    /// Find a marker by ID on this object or any descendant, together with
    /// the accumulated transform from this object to the marker's owner.
    fn find_marker(&self, id: u32) -> Option<(Marker, Iso3)> {
        find_marker_in(self.state(), id, &Iso3::identity())
    }

    /// Match this object's markers (children's included) against every lens
    /// of one camera.
    fn collect_seen_markers(&self, obs: &CameraObservations) -> Vec<SeenMarker> {
        let mut seen = Vec::new();
        collect_into(self.state(), obs, &Iso3::identity(), &mut seen);
        seen
    }

    /// Solve this object's pose from one camera's observations.
    fn solve_pose_from_view(&self, obs: &CameraObservations) -> ViewPoseSolution {
        solve_pose_default(self, obs)
    }

    /// World-space regions a detector front-end could watch more closely.
    fn points_of_interest(&self) -> Vec<Vec<Pt3>> {
        Vec::new()
    }
}

fn find_marker_in(state: &ObjectState, id: u32, accumulated: &Iso3) -> Option<(Marker, Iso3)> {
    for marker in &state.markers {
        if marker.id == id {
            return Some((marker.clone(), *accumulated));
        }
    }
    for child in &state.children {
        let below = accumulated * child.pose();
        if let Some(found) = find_marker_in(child.state(), id, &below) {
            return Some(found);
        }
    }
    None
}

fn collect_into(
    state: &ObjectState,
    obs: &CameraObservations,
    root_from_owner: &Iso3,
    seen: &mut Vec<SeenMarker>,
) {
    for (lens_index, lens) in obs.lenses.iter().enumerate() {
        for (det_index, det) in lens.detections.iter().enumerate() {
            for marker in &state.markers {
                if marker.id == det.id {
                    seen.push(SeenMarker {
                        id: det.id,
                        lens: lens_index,
                        detection: det_index,
                        side_length: marker.side_length,
                        image_corners: det.corners,
                        object_corners: marker.corners_in(root_from_owner),
                        object_from_marker: root_from_owner * marker.object_from_marker,
                    });
                }
            }
        }
    }
    for child in &state.children {
        let below = root_from_owner * child.pose();
        collect_into(child.state(), obs, &below, seen);
    }
}

/// Default per-view solve shared by all object kinds.
///
/// Each lens is solved independently and the best-scoring one provides the
/// pose: a single visible marker goes through the square solver, several
/// markers through the planar solver when the object declares its tags
/// coplanar, otherwise through EPnP. Closed-form estimates are always
/// polished by LM refinement before scoring. Reprojected corners are
/// collected from every lens that produced a finite solution, not just the
/// winning one.
pub fn solve_pose_default<T: TrackedObject + ?Sized>(
    object: &T,
    obs: &CameraObservations,
) -> ViewPoseSolution {
    let seen = object.collect_seen_markers(obs);
    if seen.is_empty() {
        return ViewPoseSolution::unsolved();
    }
    let coplanar = object.state().coplanar_tags;

    let mut best = ViewPoseSolution::unsolved();
    let mut feedback: Vec<(usize, usize, [Pt2; 4])> = Vec::new();
    for (lens_index, lens) in obs.lenses.iter().enumerate() {
        let markers: Vec<&SeenMarker> = seen.iter().filter(|m| m.lens == lens_index).collect();
        if markers.is_empty() {
            continue;
        }
        let mut candidate = solve_lens(lens, lens_index, &markers, coplanar);
        if candidate.is_solved() {
            feedback.append(&mut candidate.reprojected);
        }
        if candidate.score(DEFAULT_SCORE_DAMPING) > best.score(DEFAULT_SCORE_DAMPING) {
            best = candidate;
        }
    }
    best.reprojected = feedback;
    best
}

fn solve_lens(
    lens: &LensObservations,
    lens_index: usize,
    markers: &[&SeenMarker],
    coplanar: bool,
) -> ViewPoseSolution {
    let camera = &lens.camera;

    let mut object_pts = Vec::with_capacity(markers.len() * 4);
    let mut image_px = Vec::with_capacity(markers.len() * 4);
    for m in markers {
        object_pts.extend_from_slice(&m.object_corners);
        image_px.extend_from_slice(&m.image_corners);
    }

    let initial = if markers.len() == 1 {
        let m = markers[0];
        solve_square(camera, m.side_length, &m.image_corners)
            .map(|lens_from_marker| lens_from_marker * m.object_from_marker.inverse())
    } else if coplanar {
        solve_planar(camera, &object_pts, &image_px)
    } else {
        solve_epnp(camera, &object_pts, &image_px)
    };
    let initial = match initial {
        Ok(pose) => pose,
        Err(err) => {
            log::debug!("lens {} closed-form solve failed: {}", lens_index, err);
            return ViewPoseSolution::unsolved();
        }
    };

    let (lens_from_object, _report) = refine_pose(
        camera,
        &object_pts,
        &image_px,
        &initial,
        &RefineOptions::default(),
    );

    let error = reprojection_error(camera, &lens_from_object, &object_pts, &image_px)
        / markers.len() as Real;

    let mut surface = 0.0;
    let mut reprojected = Vec::with_capacity(markers.len());
    for m in markers {
        surface += quad_area(&m.image_corners);
        if let Some(corners) = project_quad(camera, &lens_from_object, &m.object_corners) {
            reprojected.push((lens_index, m.detection, corners));
        }
    }

    ViewPoseSolution {
        camera_from_object: lens.camera_from_lens * lens_from_object,
        surface,
        reprojection_error: error,
        reprojected,
    }
}
