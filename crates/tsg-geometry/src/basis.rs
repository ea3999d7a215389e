//! Trigonometric basis functions and their analytic partial derivatives.
//!
//! Every free Fourier coefficient of a toroidal surface multiplies one
//! [`Mode`]: `cos` or `sin` of `2π(m θ − n·nfp·φ)` feeding one in-plane or
//! vertical [`Component`]. Partials are taken term-wise and lifted to Cartesian
//! coordinates through `X + iY = (x̂ + iŷ)·e^{2πiφ}`.

use std::f64::consts::TAU;

use ndarray::ArrayViewMut2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tsg_math::{Point3, Vector3};

/// Highest combined (φ, θ) derivative order the evaluator produces.
pub const MAX_ORDER: usize = 2;

/// Which coordinate a coefficient contributes to.
///
/// `Xhat` and `Yhat` live in the plane rotated with the toroidal angle; in the
/// RZ representation `Xhat` is the major radius R and `Yhat` is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Xhat,
    Yhat,
    Z,
}

impl Component {
    /// The parity that survives stellarator symmetry.
    pub fn symmetric_parity(self) -> Parity {
        match self {
            Component::Xhat => Parity::Cos,
            Component::Yhat | Component::Z => Parity::Sin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parity {
    Cos,
    Sin,
}

impl Parity {
    pub fn suffix(self) -> char {
        match self {
            Parity::Cos => 'c',
            Parity::Sin => 's',
        }
    }
}

/// Partial derivative of the position field with respect to the normalized angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partial {
    Value,
    Phi,
    Theta,
    PhiPhi,
    PhiTheta,
    ThetaTheta,
}

impl Partial {
    /// `(a, b)` such that the partial is `∂φ^a ∂θ^b`.
    pub fn orders(self) -> (usize, usize) {
        match self {
            Partial::Value => (0, 0),
            Partial::Phi => (1, 0),
            Partial::Theta => (0, 1),
            Partial::PhiPhi => (2, 0),
            Partial::PhiTheta => (1, 1),
            Partial::ThetaTheta => (0, 2),
        }
    }

    pub fn total_order(self) -> usize {
        let (a, b) = self.orders();
        a + b
    }
}

/// `k`-th derivative of `cos` or `sin` evaluated at an angle with sine `s`, cosine `c`.
pub fn trig_derivative(parity: Parity, k: usize, s: f64, c: f64) -> f64 {
    match (parity, k % 4) {
        (Parity::Cos, 0) => c,
        (Parity::Cos, 1) => -s,
        (Parity::Cos, 2) => -c,
        (Parity::Cos, _) => s,
        (Parity::Sin, 0) => s,
        (Parity::Sin, 1) => c,
        (Parity::Sin, 2) => -s,
        (Parity::Sin, _) => -c,
    }
}

/// One basis function of a toroidal Fourier series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mode {
    pub component: Component,
    pub parity: Parity,
    pub m: i32,
    pub n: i32,
}

impl Mode {
    /// Whether this mode is one of the redundant `m = 0` entries never used as a dof.
    ///
    /// For `m = 0` the modes with `n < 0` duplicate `n > 0`, and `sin` with `n = 0` vanishes.
    pub fn is_redundant(m: i32, n: i32, parity: Parity) -> bool {
        m == 0 && (n < 0 || (n == 0 && parity == Parity::Sin))
    }
}

/// Position and partials of a surface at one parameter pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfacePoint {
    pub gamma: Point3,
    pub dash1: Vector3,
    pub dash2: Vector3,
    pub dash1dash1: Vector3,
    pub dash1dash2: Vector3,
    pub dash2dash2: Vector3,
}

impl SurfacePoint {
    pub fn get(&self, partial: Partial) -> Vector3 {
        match partial {
            Partial::Value => self.gamma,
            Partial::Phi => self.dash1,
            Partial::Theta => self.dash2,
            Partial::PhiPhi => self.dash1dash1,
            Partial::PhiTheta => self.dash1dash2,
            Partial::ThetaTheta => self.dash2dash2,
        }
    }
}

const BINOMIAL: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 2.0, 1.0]];

/// Partials of the rotating-frame series `w = x̂ + iŷ` and of `z`, indexed `[a][b]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesPartials {
    w: [[Complex64; MAX_ORDER + 1]; MAX_ORDER + 1],
    z: [[f64; MAX_ORDER + 1]; MAX_ORDER + 1],
}

impl SeriesPartials {
    /// Add `coeff · mode` and its partials up to `max_order`.
    pub fn accumulate(
        &mut self,
        mode: &Mode,
        coeff: f64,
        nfp: u32,
        phi: f64,
        theta: f64,
        max_order: usize,
    ) {
        let nfp_f = nfp as f64;
        let dphi = -TAU * mode.n as f64 * nfp_f;
        let dtheta = TAU * mode.m as f64;
        let (s, c) = (TAU * (mode.m as f64 * theta - mode.n as f64 * nfp_f * phi)).sin_cos();
        for a in 0..=max_order {
            for b in 0..=(max_order - a) {
                let g = coeff
                    * trig_derivative(mode.parity, a + b, s, c)
                    * dphi.powi(a as i32)
                    * dtheta.powi(b as i32);
                match mode.component {
                    Component::Xhat => self.w[a][b].re += g,
                    Component::Yhat => self.w[a][b].im += g,
                    Component::Z => self.z[a][b] += g,
                }
            }
        }
    }

    /// Cartesian `∂φ^a ∂θ^b` of the position, applying the product rule to `w·e^{iΦ}`.
    pub fn lift(&self, phi: f64, a: usize, b: usize) -> Vector3 {
        let rotation = Complex64::from_polar(1.0, TAU * phi);
        let twopi_i = Complex64::new(0.0, TAU);
        let mut xy = Complex64::new(0.0, 0.0);
        for k in 0..=a {
            xy += BINOMIAL[a][k] * twopi_i.powu(k as u32) * self.w[a - k][b];
        }
        xy *= rotation;
        Vector3::new(xy.re, xy.im, self.z[a][b])
    }

    pub fn to_point(&self, phi: f64, max_order: usize) -> SurfacePoint {
        let mut point = SurfacePoint {
            gamma: self.lift(phi, 0, 0),
            ..SurfacePoint::default()
        };
        if max_order >= 1 {
            point.dash1 = self.lift(phi, 1, 0);
            point.dash2 = self.lift(phi, 0, 1);
        }
        if max_order >= 2 {
            point.dash1dash1 = self.lift(phi, 2, 0);
            point.dash1dash2 = self.lift(phi, 1, 1);
            point.dash2dash2 = self.lift(phi, 0, 2);
        }
        point
    }
}

/// Evaluate `Σ coeff · mode` and its partials up to `max_order` at `(phi, theta)`.
pub fn evaluate_series<I>(
    terms: I,
    nfp: u32,
    phi: f64,
    theta: f64,
    max_order: usize,
) -> SurfacePoint
where
    I: IntoIterator<Item = (Mode, f64)>,
{
    let max_order = max_order.min(MAX_ORDER);
    let mut partials = SeriesPartials::default();
    for (mode, coeff) in terms {
        partials.accumulate(&mode, coeff, nfp, phi, theta, max_order);
    }
    partials.to_point(phi, max_order)
}

/// Jacobian of one partial of the position with respect to the coefficients of `modes`.
///
/// `out` has shape `(3, modes.len())`; column `k` is the partial of the basis
/// function of `modes[k]` lifted to Cartesian coordinates.
pub fn series_jacobian<'a, I>(
    modes: I,
    nfp: u32,
    phi: f64,
    theta: f64,
    partial: Partial,
    mut out: ArrayViewMut2<f64>,
) where
    I: IntoIterator<Item = &'a Mode>,
{
    let (a, b) = partial.orders();
    for (k, mode) in modes.into_iter().enumerate() {
        let mut single = SeriesPartials::default();
        single.accumulate(mode, 1.0, nfp, phi, theta, a + b);
        let v = single.lift(phi, a, b);
        out[[0, k]] = v.x;
        out[[1, k]] = v.y;
        out[[2, k]] = v.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn torus_terms(major: f64, minor: f64) -> Vec<(Mode, f64)> {
        vec![
            (Mode { component: Component::Xhat, parity: Parity::Cos, m: 0, n: 0 }, major),
            (Mode { component: Component::Xhat, parity: Parity::Cos, m: 1, n: 0 }, minor),
            (Mode { component: Component::Z, parity: Parity::Sin, m: 1, n: 0 }, minor),
        ]
    }

    #[test]
    fn test_torus_position() {
        let p = evaluate_series(torus_terms(3.0, 1.0), 1, 0.25, 0.0, 0);
        assert!((p.gamma - Vector3::new(0.0, 4.0, 0.0)).length() < 1e-12);
        let p = evaluate_series(torus_terms(3.0, 1.0), 1, 0.0, 0.25, 0);
        assert!((p.gamma - Vector3::new(3.0, 0.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_torus_tangents() {
        let (phi, theta) = (0.1, 0.3);
        let p = evaluate_series(torus_terms(3.0, 1.0), 1, phi, theta, 2);
        let r = 3.0 + (2.0 * PI * theta).cos();
        let tangent = Vector3::new(-(2.0 * PI * phi).sin(), (2.0 * PI * phi).cos(), 0.0);
        let expected_dash1 = 2.0 * PI * r * tangent;
        assert!((p.dash1 - expected_dash1).length() < 1e-12);
        // ∂φφ of a circle of radius r points to the axis with magnitude (2π)² r.
        let expected = -(2.0 * PI).powi(2) * r;
        assert!((p.dash1dash1.length() - expected.abs()).abs() < 1e-10);
        assert!(p.dash1dash1.z.abs() < 1e-12);
    }

    #[test]
    fn test_phi_partial_matches_difference_quotient() {
        let terms = vec![
            (Mode { component: Component::Xhat, parity: Parity::Cos, m: 0, n: 0 }, 1.0),
            (Mode { component: Component::Yhat, parity: Parity::Sin, m: 1, n: -1 }, 0.2),
            (Mode { component: Component::Xhat, parity: Parity::Sin, m: 2, n: 1 }, 0.05),
            (Mode { component: Component::Z, parity: Parity::Cos, m: 1, n: 1 }, 0.3),
        ];
        let h = 1e-6;
        let p = evaluate_series(terms.clone(), 3, 0.4, 0.7, 2);
        let plus = evaluate_series(terms.clone(), 3, 0.4 + h, 0.7, 1);
        let minus = evaluate_series(terms.clone(), 3, 0.4 - h, 0.7, 1);
        let fd = (plus.dash2 - minus.dash2) / (2.0 * h);
        assert!((fd - p.dash1dash2).length() < 1e-6 * p.dash1dash2.length().max(1.0));
        let fd = (plus.gamma - minus.gamma) / (2.0 * h);
        assert!((fd - p.dash1).length() < 1e-6 * p.dash1.length().max(1.0));
    }

    #[test]
    fn test_jacobian_columns_are_unit_terms() {
        let modes: Vec<Mode> = torus_terms(1.0, 1.0).into_iter().map(|(m, _)| m).collect();
        let mut jac = ndarray::Array2::zeros((3, modes.len()));
        series_jacobian(&modes, 2, 0.3, 0.6, Partial::Theta, jac.view_mut());
        for (k, mode) in modes.iter().enumerate() {
            let p = evaluate_series([(*mode, 1.0)], 2, 0.3, 0.6, 1);
            assert!((jac[[0, k]] - p.dash2.x).abs() < 1e-14);
            assert!((jac[[2, k]] - p.dash2.z).abs() < 1e-14);
        }
    }

    #[test]
    fn test_redundant_modes() {
        assert!(Mode::is_redundant(0, -1, Parity::Cos));
        assert!(Mode::is_redundant(0, 0, Parity::Sin));
        assert!(!Mode::is_redundant(0, 0, Parity::Cos));
        assert!(!Mode::is_redundant(1, -2, Parity::Sin));
    }
}
