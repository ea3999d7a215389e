/// Per-instance numerical settings for root finding and fitting.
///
/// Every surface carries its own copy, so tests and optimizers can tighten or loosen
/// the solvers without touching process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    /// Width (in normalized φ) below which cross-section bisection stops.
    pub bisection_tol: f64,
    /// Upper bound on bisection steps before reporting non-convergence.
    pub max_bisection_iters: usize,
    /// Relative singular value cutoff for the least-squares solve.
    pub lstsq_rcond: f64,
    /// Squared cylindrical radius below which a sample counts as on-axis.
    pub axis_eps: f64,
}

impl Settings {
    pub const DEFAULT_BISECTION_TOL: f64 = 1e-15;
    pub const DEFAULT_MAX_BISECTION_ITERS: usize = 200;
    pub const DEFAULT_LSTSQ_RCOND: f64 = 1e-13;
    pub const DEFAULT_AXIS_EPS: f64 = 1e-24;

    pub fn new(bisection_tol: f64, max_bisection_iters: usize) -> Self {
        Self {
            bisection_tol,
            max_bisection_iters,
            ..Self::default_precision()
        }
    }

    pub fn default_precision() -> Self {
        Self {
            bisection_tol: Self::DEFAULT_BISECTION_TOL,
            max_bisection_iters: Self::DEFAULT_MAX_BISECTION_ITERS,
            lstsq_rcond: Self::DEFAULT_LSTSQ_RCOND,
            axis_eps: Self::DEFAULT_AXIS_EPS,
        }
    }

    pub fn loose() -> Self {
        Self {
            bisection_tol: 1e-10,
            max_bisection_iters: 64,
            lstsq_rcond: 1e-10,
            axis_eps: 1e-16,
        }
    }

    /// Check that a bisection interval is narrow enough to stop.
    pub fn interval_converged(self, a: f64, b: f64) -> bool {
        (b - a).abs() <= self.bisection_tol
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::default_precision()
    }
}
