//! Multi-view pose fusion.
//!
//! Each camera that solves an object contributes one scored proposal. A
//! single marker seen by one camera pins the bearing well but the range
//! poorly; intersecting the sight rays of two cameras recovers the range
//! far better than either view alone, which is the whole point of running
//! several cameras.

use nalgebra::Translation3;
use tagtrack_core::{closest_points_on_lines, Iso3, Pt3, Real, Vec3};

/// Damping added to the reprojection error when scoring a view, keeping
/// near-zero errors from producing unbounded scores.
pub const DEFAULT_SCORE_DAMPING: Real = 0.1;

/// One camera's opinion about an object's world pose.
#[derive(Debug, Clone)]
pub struct PoseProposal {
    /// View score, `surface / (reprojection_error + damping)`.
    pub score: Real,
    pub world_from_object: Iso3,
    pub world_from_camera: Iso3,
}

impl PoseProposal {
    /// Sight ray from the camera through the solved object position, as an
    /// origin and a (non-unit) direction.
    fn sight_ray(&self) -> (Pt3, Vec3) {
        let origin = self.world_from_camera.translation.vector;
        let dir = self.world_from_object.translation.vector - origin;
        (Pt3::from(origin), dir)
    }
}

/// Fuse per-camera proposals into one world pose.
///
/// Policy: the two best-scoring proposals are kept and their sight rays
/// intersected; the two closest-approach points are blended by score and
/// the orientation comes from the best proposal. A single proposal is
/// adopted as-is. Returns `None` only for an empty slate; parallel sight
/// rays (cameras stacked along one line) fall back to the best proposal
/// alone.
pub fn intersect_proposals(proposals: &[PoseProposal]) -> Option<Iso3> {
    let (first, rest) = proposals.split_first()?;
    if rest.is_empty() {
        return Some(first.world_from_object);
    }

    let mut best = first;
    let mut second: Option<&PoseProposal> = None;
    for p in rest {
        if p.score > best.score {
            second = Some(best);
            best = p;
        } else if second.map_or(true, |s| p.score > s.score) {
            second = Some(p);
        }
    }
    let Some(second) = second else {
        return Some(best.world_from_object);
    };

    let total = best.score + second.score;
    if total <= 0.0 {
        return Some(best.world_from_object);
    }

    let (origin_a, dir_a) = best.sight_ray();
    let (origin_b, dir_b) = second.sight_ray();
    let fused = match closest_points_on_lines(&origin_a, &dir_a, &origin_b, &dir_b) {
        Some((on_a, on_b)) => (on_a.coords * best.score + on_b.coords * second.score) / total,
        None => {
            log::debug!("parallel sight rays, keeping the best single view");
            return Some(best.world_from_object);
        }
    };

    Some(Iso3::from_parts(Translation3::from(fused), best.world_from_object.rotation))
}
