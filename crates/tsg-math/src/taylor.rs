//! Finite-difference checks for analytic dof Jacobians.
//!
//! These helpers are verification tooling: the geometry crates never use finite
//! differences to produce derivatives, but their tests compare every analytic
//! Jacobian against the centered estimates computed here.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Absolute error below which a Taylor test stops early.
pub const ABSOLUTE_FLOOR: f64 = 1e-9;

/// Stencil used to estimate the directional derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaylorOrder {
    Second,
    Fourth,
}

impl TaylorOrder {
    /// Required error reduction per halving of the step.
    fn decay(self) -> f64 {
        match self {
            TaylorOrder::Second => 0.3,
            TaylorOrder::Fourth => 0.13,
        }
    }
}

/// Step sizes `2^-start, ..., 2^-(end-1)`.
pub fn dyadic_steps(start: i32, end: i32) -> Vec<f64> {
    (start..end).map(|k| 2f64.powi(-k)).collect()
}

/// Random direction with entries in `[-0.5, 0.5)`, reproducible from `seed`.
pub fn random_direction(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen::<f64>() - 0.5).collect()
}

#[derive(Debug, Clone)]
pub struct TaylorReport {
    /// Error of the finite-difference estimate for each step tried.
    pub errors: Vec<f64>,
    pub failure: Option<String>,
}

impl TaylorReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Compare `df(x) · direction` against centered differences of `f` along `direction`.
///
/// The error must shrink by at least the stencil's decay factor at each step until it
/// falls under [`ABSOLUTE_FLOOR`]; a test that never reaches the floor must have
/// seen at least three shrinking steps.
pub fn taylor_test<F, DF>(
    mut f: F,
    mut df: DF,
    x: &[f64],
    direction: &[f64],
    steps: &[f64],
    order: TaylorOrder,
) -> TaylorReport
where
    F: FnMut(&[f64]) -> Vec<f64>,
    DF: FnMut(&[f64]) -> Array2<f64>,
{
    let jac = df(x);
    let dir = Array1::from_iter(direction.iter().copied());
    let exact = jac.dot(&dir);

    let shifted = |f: &mut F, scale: f64| -> Array1<f64> {
        let xs: Vec<f64> = x
            .iter()
            .zip(direction)
            .map(|(xi, di)| xi + scale * di)
            .collect();
        Array1::from_vec(f(&xs))
    };

    let mut errors = Vec::new();
    let mut err_old = 1e9;
    let mut err = f64::INFINITY;
    for &eps in steps.iter().take(9) {
        let estimate = match order {
            TaylorOrder::Second => (shifted(&mut f, eps) - shifted(&mut f, -eps)) / (2.0 * eps),
            TaylorOrder::Fourth => {
                let p1 = shifted(&mut f, eps);
                let m1 = shifted(&mut f, -eps);
                let p2 = shifted(&mut f, 2.0 * eps);
                let m2 = shifted(&mut f, -2.0 * eps);
                (m2 / 12.0 - m1 * (2.0 / 3.0) + p1 * (2.0 / 3.0) - p2 / 12.0) / eps
            }
        };
        err = (&estimate - &exact).mapv(|v| v * v).sum().sqrt();
        errors.push(err);
        if err < ABSOLUTE_FLOOR {
            break;
        }
        if err >= order.decay() * err_old {
            return TaylorReport {
                failure: Some(format!(
                    "error {err:e} at step {eps:e} did not shrink from {err_old:e}"
                )),
                errors,
            };
        }
        err_old = err;
    }

    let failure = if err >= ABSOLUTE_FLOOR && errors.len() <= 2 {
        Some(format!("only {} steps before stopping at {err:e}", errors.len()))
    } else {
        None
    };
    TaylorReport { errors, failure }
}

/// Centered finite-difference Jacobian of `f` at `x`, shape `(outputs, inputs)`.
pub fn fd_jacobian<F>(mut f: F, x: &[f64], h: f64) -> Array2<f64>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    let f0 = f(x);
    let mut jac = Array2::zeros((f0.len(), x.len()));
    let mut xs = x.to_vec();
    for j in 0..x.len() {
        xs[j] = x[j] + h;
        let fp = f(&xs);
        xs[j] = x[j] - h;
        let fm = f(&xs);
        xs[j] = x[j];
        for i in 0..f0.len() {
            jac[[i, j]] = (fp[i] - fm[i]) / (2.0 * h);
        }
    }
    jac
}
