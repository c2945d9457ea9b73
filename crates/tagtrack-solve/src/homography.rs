use nalgebra::DMatrix;
use tagtrack_core::{Mat3, Real, Vec2};

use crate::SolveError;

/// Estimate H such that `dst ~ H src` using DLT.
///
/// Both sides are 2D in homogeneous form; here `src` holds object-plane
/// coordinates and `dst` normalized (undistorted, K-free) image coordinates,
/// which keeps the system well-conditioned without extra normalization.
/// Four correspondences determine H exactly; more are solved in the
/// least-squares sense.
pub fn dlt_homography(src: &[Vec2], dst: &[Vec2]) -> Result<Mat3, SolveError> {
    let n = src.len();
    if n < 4 {
        return Err(SolveError::NotEnoughPoints { needed: 4, got: n });
    }
    if dst.len() != n {
        return Err(SolveError::MismatchedPoints(n, dst.len()));
    }

    let mut a = DMatrix::<Real>::zeros(2 * n, 9);

    for (i, (ps, pd)) in src.iter().zip(dst.iter()).enumerate() {
        let x = ps.x;
        let y = ps.y;
        let u = pd.x;
        let v = pd.y;

        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    // Solve A h = 0 via SVD (smallest singular value)
    let svd = a.svd(true, true);
    let v_t = svd.v_t.ok_or(SolveError::SvdFailed)?;
    let h = v_t.row(v_t.nrows() - 1);

    let mut h_mat = Mat3::zeros();
    for r in 0..3 {
        for c in 0..3 {
            h_mat[(r, c)] = h[3 * r + c];
        }
    }

    // normalise such that H[2,2] = 1
    let scale = h_mat[(2, 2)];
    if scale.abs() > Real::EPSILON {
        h_mat /= scale;
    }

    Ok(h_mat)
}
