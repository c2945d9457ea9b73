//! EPnP (Efficient Perspective-n-Point) pose solver.
//!
//! Lepetit's control-point formulation for 4+ points: the object points are
//! expressed in a basis of four control points derived from their
//! covariance, the control points are located in the lens frame via a DLT,
//! and the rigid transform is recovered by Kabsch alignment. This is the
//! path for marker sets that do not share a plane.

use nalgebra::{linalg::SymmetricEigen, DMatrix, Rotation3, Translation3, UnitQuaternion};
use tagtrack_core::{CameraModel, Iso3, Mat3, Pt2, Pt3, Real, Vec2, Vec3};

use crate::SolveError;

/// Pose of a rigid point set relative to a lens. Returns lens-from-object.
pub fn solve_epnp(
    camera: &CameraModel,
    object: &[Pt3],
    image_px: &[Pt2],
) -> Result<Iso3, SolveError> {
    let n = object.len();
    if n < 4 {
        return Err(SolveError::NotEnoughPoints { needed: 4, got: n });
    }
    if image_px.len() != n {
        return Err(SolveError::MismatchedPoints(n, image_px.len()));
    }

    let img_norm: Vec<Vec2> = image_px.iter().map(|p| camera.normalize_pixel(p)).collect();

    let mut centroid = Vec3::zeros();
    for p in object {
        centroid += p.coords;
    }
    centroid /= n as Real;

    let mut cov = Mat3::zeros();
    for p in object {
        let d = p.coords - centroid;
        cov += d * d.transpose();
    }
    cov /= n as Real;

    let eig = SymmetricEigen::new(cov);
    let axes = eig.eigenvectors;
    let vals = eig.eigenvalues;

    let mut control_w = [Vec3::zeros(); 4];
    control_w[0] = centroid;
    for i in 0..3 {
        // Degenerate axes (coplanar or collinear sets) still need a full
        // basis; pad with a unit step along the eigenvector.
        let scale = vals[i].abs().sqrt().max(1e-6);
        let axis = axes.column(i).into_owned();
        control_w[i + 1] = centroid + axis * scale;
    }

    let basis = Mat3::from_columns(&[
        control_w[1] - control_w[0],
        control_w[2] - control_w[0],
        control_w[3] - control_w[0],
    ]);
    let basis_inv = basis.try_inverse().ok_or(SolveError::DegeneratePoints)?;

    let mut alphas = Vec::with_capacity(n);
    for p in object {
        let coeff = basis_inv * (p.coords - control_w[0]);
        let a0 = 1.0 - coeff.x - coeff.y - coeff.z;
        alphas.push([a0, coeff.x, coeff.y, coeff.z]);
    }

    let mut m = DMatrix::<Real>::zeros(2 * n, 12);
    for (i, (a, uv)) in alphas.iter().zip(img_norm.iter()).enumerate() {
        let r0 = 2 * i;
        let r1 = 2 * i + 1;
        let u = uv.x;
        let v = uv.y;
        for (j, &alpha) in a.iter().enumerate().take(4) {
            let c = 3 * j;
            m[(r0, c)] = alpha;
            m[(r0, c + 2)] = -u * alpha;
            m[(r1, c + 1)] = alpha;
            m[(r1, c + 2)] = -v * alpha;
        }
    }

    let svd = m.svd(true, true);
    let v_t = svd.v_t.ok_or(SolveError::SvdFailed)?;
    let sol = v_t.row(v_t.nrows() - 1);

    let mut control_c = [Vec3::zeros(); 4];
    for (j, cc) in control_c.iter_mut().enumerate() {
        *cc = Vec3::new(sol[3 * j], sol[3 * j + 1], sol[3 * j + 2]);
    }

    let mut sum_w = 0.0;
    let mut sum_c = 0.0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let dw = (control_w[i] - control_w[j]).norm();
            let dc = (control_c[i] - control_c[j]).norm();
            sum_w += dw * dw;
            sum_c += dc * dc;
        }
    }

    if sum_c <= Real::EPSILON {
        return Err(SolveError::DegeneratePoints);
    }

    let scale = (sum_w / sum_c).sqrt();
    for cc in &mut control_c {
        *cc *= scale;
    }

    let mut camera_pts = Vec::with_capacity(n);
    for a in &alphas {
        let mut pc = Vec3::zeros();
        for (j, &alpha) in a.iter().enumerate().take(4) {
            pc += control_c[j] * alpha;
        }
        camera_pts.push(pc);
    }

    // The DLT null vector has arbitrary sign; the object must reconstruct
    // in front of the lens.
    let mean_z: Real = camera_pts.iter().map(|p| p.z).sum::<Real>() / n as Real;
    if mean_z < 0.0 {
        for p in &mut camera_pts {
            *p = -*p;
        }
    }

    pose_from_points(object, &camera_pts)
}

/// Rigid transform aligning object points onto lens-frame points (Kabsch).
fn pose_from_points(object: &[Pt3], lens: &[Vec3]) -> Result<Iso3, SolveError> {
    if object.len() != lens.len() || object.len() < 3 {
        return Err(SolveError::DegeneratePoints);
    }

    let n = object.len() as Real;
    let mut c_o = Vec3::zeros();
    let mut c_l = Vec3::zeros();
    for (po, pl) in object.iter().zip(lens.iter()) {
        c_o += po.coords;
        c_l += pl;
    }
    c_o /= n;
    c_l /= n;

    let mut h = Mat3::zeros();
    for (po, pl) in object.iter().zip(lens.iter()) {
        let d_o = po.coords - c_o;
        let d_l = pl - c_l;
        h += d_l * d_o.transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(SolveError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(SolveError::SvdFailed)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fix = u;
        u_fix.column_mut(2).neg_mut();
        r = u_fix * v_t;
    }

    let t = c_l - r * c_o;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    Ok(Iso3::from_parts(Translation3::from(t), rot))
}
