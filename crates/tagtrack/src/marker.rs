//! Square fiducial markers attached to tracked objects.

use tagtrack_core::{square_corners, Iso3, Pt3, Real};

/// A square marker rigidly mounted on an object.
///
/// `object_from_marker` places the marker in its owning object's frame; the
/// marker's own frame has the printed face in the Z = 0 plane with +Z as the
/// face normal. Markers are immutable once built; validity (positive side
/// length, ID within the dictionary) is enforced when the owning object is
/// registered with a tracker.
#[derive(Debug, Clone)]
pub struct Marker {
    pub side_length: Real,
    pub id: u32,
    pub object_from_marker: Iso3,
}

impl Marker {
    pub fn new(side_length: Real, id: u32, object_from_marker: Iso3) -> Self {
        Self {
            side_length,
            id,
            object_from_marker,
        }
    }

    /// A marker sitting at its object's origin, face up.
    pub fn at_origin(side_length: Real, id: u32) -> Self {
        Self::new(side_length, id, Iso3::identity())
    }

    /// Corners in the marker's own frame, detector winding order.
    pub fn local_corners(&self) -> [Pt3; 4] {
        square_corners(self.side_length)
    }

    /// Corners in the frame of the object being solved.
    ///
    /// `root_from_object` accumulates the transforms from the solving root
    /// down to this marker's direct owner (identity when the marker sits on
    /// the root itself).
    pub fn corners_in(&self, root_from_object: &Iso3) -> [Pt3; 4] {
        let root_from_marker = root_from_object * self.object_from_marker;
        self.local_corners()
            .map(|c| root_from_marker.transform_point(&c))
    }
}
