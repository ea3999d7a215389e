//! Closed curves in 3D and their dof derivatives.

mod rotated;
mod xyzfourier;

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array1, Array2, Array3};
use tsg_core::{cache_struct, DependencyRegistry, Dependent, DependentKey, Result, TsgError};
use tsg_math::Vector3;

pub use rotated::RotatedCurve;
pub use xyzfourier::CurveXYZFourier;

/// Unit tangent, normal and binormal at every quadrature point, each `(n, 3)`.
#[derive(Debug, Clone)]
pub struct FrenetFrame {
    pub tangent: Array2<f64>,
    pub normal: Array2<f64>,
    pub binormal: Array2<f64>,
}

cache_struct! {
    /// Memoized curve quantities; Jacobians are `(n, 3, ndofs)`.
    pub struct CurveCache {
        gamma: Array2<f64>,
        gammadash: Array2<f64>,
        gammadashdash: Array2<f64>,
        gammadashdashdash: Array2<f64>,
        dgamma_by_dcoeff: Array3<f64>,
        dgammadash_by_dcoeff: Array3<f64>,
        dgammadashdash_by_dcoeff: Array3<f64>,
        dgammadashdashdash_by_dcoeff: Array3<f64>,
        incremental_arclength: Array1<f64>,
        dincremental_arclength_by_dcoeff: Array2<f64>,
        kappa: Array1<f64>,
        dkappa_by_dcoeff: Array2<f64>,
        frenet_frame: FrenetFrame,
    }
}

fn row(a: &Array2<f64>, i: usize) -> Vector3 {
    Vector3::new(a[[i, 0]], a[[i, 1]], a[[i, 2]])
}

fn column(a: &Array3<f64>, i: usize, k: usize) -> Vector3 {
    Vector3::new(a[[i, 0, k]], a[[i, 1, k]], a[[i, 2, k]])
}

fn zero_tangent(i: usize) -> TsgError {
    TsgError::DegenerateGeometry(format!("curve tangent vanishes at quadrature point {i}"))
}

/// A closed curve `γ(t)`, `t ∈ [0, 1)`, sampled at fixed quadrature points.
///
/// Implementors supply the raw derivatives; everything else is derived and memoized
/// in [`Curve::cache`].
pub trait Curve {
    fn quadpoints(&self) -> &[f64];

    fn cache(&self) -> &CurveCache;

    fn dependents(&self) -> &RefCell<DependencyRegistry>;

    /// `order`-th derivative of the position at every quadrature point, `(n, 3)`.
    fn compute_gamma(&self, order: usize) -> Array2<f64>;

    /// Jacobian of [`Curve::compute_gamma`] with respect to the dofs, `(n, 3, ndofs)`.
    fn compute_dgamma_by_dcoeff(&self, order: usize) -> Array3<f64>;

    fn register_dependent(&self, dependent: &Rc<dyn Dependent>) -> DependentKey {
        self.dependents().borrow_mut().register(dependent)
    }

    fn unregister_dependent(&self, key: DependentKey) -> bool {
        self.dependents().borrow_mut().unregister(key)
    }

    fn gamma(&self) -> Rc<Array2<f64>> {
        self.cache().gamma.get_or_init(|| self.compute_gamma(0))
    }

    fn gammadash(&self) -> Rc<Array2<f64>> {
        self.cache().gammadash.get_or_init(|| self.compute_gamma(1))
    }

    fn gammadashdash(&self) -> Rc<Array2<f64>> {
        self.cache().gammadashdash.get_or_init(|| self.compute_gamma(2))
    }

    fn gammadashdashdash(&self) -> Rc<Array2<f64>> {
        self.cache().gammadashdashdash.get_or_init(|| self.compute_gamma(3))
    }

    fn dgamma_by_dcoeff(&self) -> Rc<Array3<f64>> {
        self.cache()
            .dgamma_by_dcoeff
            .get_or_init(|| self.compute_dgamma_by_dcoeff(0))
    }

    fn dgammadash_by_dcoeff(&self) -> Rc<Array3<f64>> {
        self.cache()
            .dgammadash_by_dcoeff
            .get_or_init(|| self.compute_dgamma_by_dcoeff(1))
    }

    fn dgammadashdash_by_dcoeff(&self) -> Rc<Array3<f64>> {
        self.cache()
            .dgammadashdash_by_dcoeff
            .get_or_init(|| self.compute_dgamma_by_dcoeff(2))
    }

    fn dgammadashdashdash_by_dcoeff(&self) -> Rc<Array3<f64>> {
        self.cache()
            .dgammadashdashdash_by_dcoeff
            .get_or_init(|| self.compute_dgamma_by_dcoeff(3))
    }

    /// `‖γ'‖` at every quadrature point.
    fn incremental_arclength(&self) -> Rc<Array1<f64>> {
        self.cache().incremental_arclength.get_or_init(|| {
            let d = self.gammadash();
            d.rows().into_iter().map(|r| r.dot(&r).sqrt()).collect()
        })
    }

    fn dincremental_arclength_by_dcoeff(&self) -> Result<Rc<Array2<f64>>> {
        self.cache().dincremental_arclength_by_dcoeff.get_or_try_init(|| {
            let d = self.gammadash();
            let dd = self.dgammadash_by_dcoeff();
            let (n, _, ndofs) = dd.dim();
            let mut out = Array2::zeros((n, ndofs));
            for i in 0..n {
                let a = row(&d, i);
                let norm = a.length();
                if norm == 0.0 {
                    return Err(zero_tangent(i));
                }
                for k in 0..ndofs {
                    out[[i, k]] = a.dot(column(&dd, i, k)) / norm;
                }
            }
            Ok(out)
        })
    }

    /// Mean of the incremental arclength, i.e. the length for a uniform parameterization.
    fn length(&self) -> f64 {
        let l = self.incremental_arclength();
        l.mean().unwrap_or(0.0)
    }

    fn dlength_by_dcoeff(&self) -> Result<Array1<f64>> {
        let dl = self.dincremental_arclength_by_dcoeff()?;
        Ok(dl.sum_axis(ndarray::Axis(0)) / dl.nrows() as f64)
    }

    /// `‖γ' × γ''‖ / ‖γ'‖³`.
    fn kappa(&self) -> Result<Rc<Array1<f64>>> {
        self.cache().kappa.get_or_try_init(|| {
            let d1 = self.gammadash();
            let d2 = self.gammadashdash();
            let n = d1.nrows();
            let mut out = Array1::zeros(n);
            for i in 0..n {
                let (a, b) = (row(&d1, i), row(&d2, i));
                let norm = a.length();
                if norm == 0.0 {
                    return Err(zero_tangent(i));
                }
                out[i] = a.cross(b).length() / norm.powi(3);
            }
            Ok(out)
        })
    }

    fn dkappa_by_dcoeff(&self) -> Result<Rc<Array2<f64>>> {
        self.cache().dkappa_by_dcoeff.get_or_try_init(|| {
            let d1 = self.gammadash();
            let d2 = self.gammadashdash();
            let dd1 = self.dgammadash_by_dcoeff();
            let dd2 = self.dgammadashdash_by_dcoeff();
            let (n, _, ndofs) = dd1.dim();
            let mut out = Array2::zeros((n, ndofs));
            for i in 0..n {
                let (a, b) = (row(&d1, i), row(&d2, i));
                let c = a.cross(b);
                let (na, nc) = (a.length(), c.length());
                if na == 0.0 {
                    return Err(zero_tangent(i));
                }
                if nc == 0.0 {
                    return Err(TsgError::DegenerateGeometry(format!(
                        "curvature vanishes at quadrature point {i}, its gradient is undefined"
                    )));
                }
                for k in 0..ndofs {
                    let (da, db) = (column(&dd1, i, k), column(&dd2, i, k));
                    let dc = da.cross(b) + a.cross(db);
                    out[[i, k]] = c.dot(dc) / (nc * na.powi(3)) - 3.0 * nc * a.dot(da) / na.powi(5);
                }
            }
            Ok(out)
        })
    }

    /// Tangent, principal normal and binormal; fails where the curvature vanishes.
    fn frenet_frame(&self) -> Result<Rc<FrenetFrame>> {
        self.cache().frenet_frame.get_or_try_init(|| {
            let d1 = self.gammadash();
            let d2 = self.gammadashdash();
            let n = d1.nrows();
            let mut frame = FrenetFrame {
                tangent: Array2::zeros((n, 3)),
                normal: Array2::zeros((n, 3)),
                binormal: Array2::zeros((n, 3)),
            };
            for i in 0..n {
                let (a, b) = (row(&d1, i), row(&d2, i));
                let t = a.try_normalize().ok_or_else(|| zero_tangent(i))?;
                let normal = (b - b.dot(t) * t).try_normalize().ok_or_else(|| {
                    TsgError::DegenerateGeometry(format!(
                        "curvature vanishes at quadrature point {i}, normal is undefined"
                    ))
                })?;
                let binormal = t.cross(normal);
                for (dst, v) in [
                    (&mut frame.tangent, t),
                    (&mut frame.normal, normal),
                    (&mut frame.binormal, binormal),
                ] {
                    dst[[i, 0]] = v.x;
                    dst[[i, 1]] = v.y;
                    dst[[i, 2]] = v.z;
                }
            }
            Ok(frame)
        })
    }
}
