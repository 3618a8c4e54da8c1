//! Levenberg–Marquardt nonlinear least squares.
//!
//! We minimize `Σ (y_i - f(x_i; p))^2` for a model from `crate::models`.
//!
//! Each iteration solves the damped Gauss–Newton step
//!
//! ```text
//! (JᵀJ + λ D) δ = Jᵀ r
//! ```
//!
//! written as the equivalent tall least-squares system `[J; sqrt(λD)] δ ≈ [r; 0]`
//! and handed to the SVD solver in `crate::math`. `D` holds the squared column
//! norms of `J` at the current iterate (Marquardt scaling), so the damping is
//! invariant to parameter units.
//!
//! Termination:
//! - the residual vanishes exactly
//! - an accepted step reduces the cost by less than `ftol` (both actual and
//!   predicted, relative to the cost), or a step is smaller than `xtol`
//!   relative to the parameter norm, AND the undamped Gauss–Newton step is
//!   small too (a step that is only small because of the damping is not a
//!   minimum)
//! - otherwise the evaluation budget is exhausted, or the damping blows up,
//!   and we report `Convergence`

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::ModelKind;
use crate::error::{CalibError, Result};
use crate::math::solve_least_squares;
use crate::models::{fill_jacobian_row, predict};

/// `sqrt(f64::EPSILON)`, the MINPACK default for both tolerances.
pub const DEFAULT_TOLERANCE: f64 = 1.490_116_119_384_765_6e-8;

const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;
const LAMBDA_FACTOR: f64 = 10.0;
/// Relative size below which the undamped step counts as zero
/// (`sqrt(DEFAULT_TOLERANCE)`).
const STATIONARY_TOLERANCE: f64 = 1.220_703_125e-4;

#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Objective evaluations allowed (accepted and rejected steps; failed
    /// linear solves do not count).
    /// `None` means `200 * (arity + 1)`.
    pub max_evaluations: Option<usize>,
    pub ftol: f64,
    pub xtol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: None,
            ftol: DEFAULT_TOLERANCE,
            xtol: DEFAULT_TOLERANCE,
            initial_lambda: 1e-3,
        }
    }
}

/// Converged solver state.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: Vec<f64>,
    /// Sum of squared residuals at `params`.
    pub cost: f64,
    pub evaluations: usize,
}

/// Fit `model` to `(xs, ys)` starting from `guess`.
///
/// Callers are expected to have validated lengths and arity already.
pub fn levenberg_marquardt(
    model: ModelKind,
    xs: &[f64],
    ys: &[f64],
    guess: &[f64],
    opts: &LmOptions,
) -> Result<LmReport> {
    let n = xs.len();
    let p = model.arity();
    let budget = opts.max_evaluations.unwrap_or(200 * (p + 1)).max(1);

    let mut params = DVector::from_column_slice(guess);
    let (mut r, mut cost) = residuals(model, xs, ys, params.as_slice());
    if !cost.is_finite() {
        return Err(CalibError::domain(format!(
            "initial guess {guess:?} produces non-finite residuals for the {} model",
            model.display_name()
        )));
    }
    let mut evaluations = 1usize;

    let mut jac = jacobian(model, xs, params.as_slice());
    let mut scale = column_scale(&jac);
    let mut lambda = opts.initial_lambda.max(LAMBDA_MIN);

    loop {
        if cost == 0.0 {
            return Ok(finish(params, cost, evaluations));
        }
        if evaluations >= budget || lambda > LAMBDA_MAX {
            return Err(CalibError::Convergence {
                iterations: evaluations,
                cost,
            });
        }

        // Augmented system [J; sqrt(λD)] δ ≈ [r; 0].
        let mut a = DMatrix::<f64>::zeros(n + p, p);
        a.view_mut((0, 0), (n, p)).copy_from(&jac);
        for j in 0..p {
            a[(n + j, j)] = (lambda * scale[j]).sqrt();
        }
        let mut b = DVector::<f64>::zeros(n + p);
        b.rows_mut(0, n).copy_from(&r);

        let Some(delta) = solve_least_squares(&a, &b) else {
            lambda *= LAMBDA_FACTOR;
            continue;
        };

        let step_norm = delta.norm();
        let small_step = step_norm <= opts.xtol * (params.norm() + opts.xtol);

        let candidate = &params + &delta;
        let (r_new, cost_new) = residuals(model, xs, ys, candidate.as_slice());
        evaluations += 1;

        if cost_new.is_finite() && cost_new < cost {
            let predicted = cost - (&r - &jac * &delta).norm_squared();
            let actual = cost - cost_new;
            let prev_cost = cost;

            params = candidate;
            r = r_new;
            cost = cost_new;
            lambda = (lambda / LAMBDA_FACTOR).max(LAMBDA_MIN);
            jac = jacobian(model, xs, params.as_slice());
            scale = column_scale(&jac);

            let flat = actual <= opts.ftol * prev_cost && predicted.abs() <= opts.ftol * prev_cost;
            if (flat || small_step) && is_stationary(&jac, &r, &params) {
                debug!(
                    model = model.display_name(),
                    evaluations,
                    cost,
                    "levenberg-marquardt converged"
                );
                return Ok(finish(params, cost, evaluations));
            }
        } else {
            lambda *= LAMBDA_FACTOR;
            if small_step && is_stationary(&jac, &r, &params) {
                debug!(
                    model = model.display_name(),
                    evaluations,
                    cost,
                    "levenberg-marquardt stopped on step tolerance"
                );
                return Ok(finish(params, cost, evaluations));
            }
        }
    }
}

fn finish(params: DVector<f64>, cost: f64, evaluations: usize) -> LmReport {
    LmReport {
        params: params.iter().copied().collect(),
        cost,
        evaluations,
    }
}

/// Residuals `y - f(x; p)` and their sum of squares.
fn residuals(model: ModelKind, xs: &[f64], ys: &[f64], params: &[f64]) -> (DVector<f64>, f64) {
    let r = DVector::from_iterator(
        xs.len(),
        xs.iter().zip(ys.iter()).map(|(&x, &y)| y - predict(model, x, params)),
    );
    let cost = r.norm_squared();
    (r, cost)
}

fn jacobian(model: ModelKind, xs: &[f64], params: &[f64]) -> DMatrix<f64> {
    let p = model.arity();
    let mut jac = DMatrix::<f64>::zeros(xs.len(), p);
    let mut row = vec![0.0; p];
    for (i, &x) in xs.iter().enumerate() {
        fill_jacobian_row(model, x, params, &mut row);
        for j in 0..p {
            jac[(i, j)] = row[j];
        }
    }
    jac
}

/// Squared column norms of `J`, floored at machine epsilon.
fn column_scale(jac: &DMatrix<f64>) -> Vec<f64> {
    jac.column_iter()
        .map(|col| {
            let norm = col.norm_squared();
            if norm.is_finite() { norm.max(f64::EPSILON) } else { f64::EPSILON }
        })
        .collect()
}

/// Whether the undamped Gauss–Newton step from `params` is negligible.
///
/// A rank-deficient Jacobian gives no usable step; that counts as stationary.
fn is_stationary(jac: &DMatrix<f64>, r: &DVector<f64>, params: &DVector<f64>) -> bool {
    solve_least_squares(jac, r).is_none_or(|step| {
        step.norm() <= STATIONARY_TOLERANCE * (params.norm() + STATIONARY_TOLERANCE)
    })
}
