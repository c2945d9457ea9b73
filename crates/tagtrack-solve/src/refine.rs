//! Levenberg-Marquardt reprojection refinement.
//!
//! Polishes a closed-form pose estimate by minimizing pixel reprojection
//! error over a 6-parameter chart `[scaled-axis rotation; translation]`.
//! The Jacobian is taken by central differences; with six parameters that
//! costs twelve projections per step and stays well inside the frame budget.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use tagtrack_core::{CameraModel, Iso3, Pt2, Pt3, Real, Vec3};

/// Stopping criteria for the refinement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefineOptions {
    pub max_iters: usize,
    pub ftol: Real,
    pub gtol: Real,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            max_iters: 50,
            ftol: 1e-10,
            gtol: 1e-10,
        }
    }
}

/// Outcome of one refinement run.
#[derive(Debug, Clone, Copy)]
pub struct RefineReport {
    pub iterations: usize,
    pub initial_cost: Real,
    pub final_cost: Real,
    pub converged: bool,
}

const DIFF_STEP: Real = 1e-6;

fn pose_from_params(x: &DVector<Real>) -> Iso3 {
    let rot = UnitQuaternion::from_scaled_axis(Vec3::new(x[0], x[1], x[2]));
    let trans = Translation3::new(x[3], x[4], x[5]);
    Iso3::from_parts(trans, rot)
}

fn params_from_pose(pose: &Iso3) -> DVector<Real> {
    let axis = pose.rotation.scaled_axis();
    let t = pose.translation.vector;
    DVector::from_vec(vec![axis.x, axis.y, axis.z, t.x, t.y, t.z])
}

struct ReprojProblem<'a> {
    camera: &'a CameraModel,
    object: &'a [Pt3],
    image: &'a [Pt2],
    params: DVector<Real>,
}

impl ReprojProblem<'_> {
    /// Residuals for arbitrary parameters; `None` when a point falls behind
    /// the lens, which makes the solver reject the step.
    fn residuals_at(&self, x: &DVector<Real>) -> Option<DVector<Real>> {
        let pose = pose_from_params(x);
        let mut r = DVector::zeros(2 * self.object.len());
        for (i, (po, px)) in self.object.iter().zip(self.image.iter()).enumerate() {
            let projected = self.camera.project_point(&pose.transform_point(po))?;
            r[2 * i] = projected.x - px.x;
            r[2 * i + 1] = projected.y - px.y;
        }
        Some(r)
    }
}

impl LeastSquaresProblem<Real, Dyn, Dyn> for ReprojProblem<'_> {
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;
    type ParameterStorage = Owned<Real, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<Real> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        self.residuals_at(&self.params)
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        let rows = 2 * self.object.len();
        let mut jac = DMatrix::zeros(rows, 6);
        for col in 0..6 {
            let mut plus = self.params.clone();
            let mut minus = self.params.clone();
            plus[col] += DIFF_STEP;
            minus[col] -= DIFF_STEP;
            let r_plus = self.residuals_at(&plus)?;
            let r_minus = self.residuals_at(&minus)?;
            for row in 0..rows {
                jac[(row, col)] = (r_plus[row] - r_minus[row]) / (2.0 * DIFF_STEP);
            }
        }
        Some(jac)
    }
}

/// Refine a lens-from-object pose against observed pixels.
///
/// Returns the refined pose, or the initial pose unchanged when refinement
/// cannot run (too few points, points behind the lens) or fails to improve
/// the objective. The report carries the LM cost bookkeeping either way.
pub fn refine_pose(
    camera: &CameraModel,
    object: &[Pt3],
    image: &[Pt2],
    initial: &Iso3,
    opts: &RefineOptions,
) -> (Iso3, RefineReport) {
    let mut report = RefineReport {
        iterations: 0,
        initial_cost: Real::INFINITY,
        final_cost: Real::INFINITY,
        converged: false,
    };

    if object.len() < 3 || object.len() != image.len() {
        return (*initial, report);
    }

    let problem = ReprojProblem {
        camera,
        object,
        image,
        params: params_from_pose(initial),
    };

    let Some(r0) = problem.residuals() else {
        return (*initial, report);
    };
    report.initial_cost = 0.5 * r0.norm_squared();

    let lm = LevenbergMarquardt::new()
        .with_ftol(opts.ftol)
        .with_xtol(opts.ftol)
        .with_gtol(opts.gtol)
        .with_patience(opts.max_iters.max(1));

    let (problem, lm_report) = lm.minimize(problem);

    report.iterations = lm_report.number_of_evaluations;
    report.final_cost = lm_report.objective_function;
    report.converged = lm_report.termination.was_successful();

    let improved = report.final_cost.is_finite() && report.final_cost <= report.initial_cost;
    if improved {
        (pose_from_params(&problem.params), report)
    } else {
        log::debug!(
            "pose refinement did not improve ({} -> {}), keeping initial estimate",
            report.initial_cost,
            report.final_cost
        );
        (*initial, report)
    }
}
