//! Differential geometry of a coefficient set sampled on a quadrature grid.

use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView3};
use tsg_core::{
    cache_struct, DependencyRegistry, Dependent, DependentKey, Invalidate, Optimizable, Result,
    Settings, TsgError,
};
use tsg_math::{lstsq, QuadratureGrid, Vector3};

use super::{cross_section, SurfaceBasis};
use crate::basis::{Partial, SurfacePoint, MAX_ORDER};

cache_struct! {
    /// Memoized fields of a [`Surface`], all indexed `[phi, theta, ...]`.
    pub struct SurfaceCache {
        points: Vec<SurfacePoint>,
        gamma: Array3<f64>,
        gammadash1: Array3<f64>,
        gammadash2: Array3<f64>,
        gammadash1dash1: Array3<f64>,
        gammadash1dash2: Array3<f64>,
        gammadash2dash2: Array3<f64>,
        normal: Array3<f64>,
        unitnormal: Array3<f64>,
        area: f64,
        volume: f64,
        dgamma_by_dcoeff: Array4<f64>,
        dgammadash1_by_dcoeff: Array4<f64>,
        dgammadash2_by_dcoeff: Array4<f64>,
        dnormal_by_dcoeff: Array4<f64>,
        darea_by_dcoeff: Array1<f64>,
        dvolume_by_dcoeff: Array1<f64>,
        mean_cross_sectional_area: f64,
    }
}

/// A toroidal surface: a coefficient set `B` together with the grid it is sampled on.
///
/// All getters are lazy and memoized until the coefficients change. Surfaces are
/// single-threaded objects; the coefficient set itself is plain `Send + Sync` data.
#[derive(Debug, Clone)]
pub struct Surface<B> {
    basis: B,
    grid: QuadratureGrid,
    settings: Settings,
    cache: SurfaceCache,
    dependents: RefCell<DependencyRegistry>,
}

fn vec_at(a: &Array3<f64>, i: usize, j: usize) -> Vector3 {
    Vector3::new(a[[i, j, 0]], a[[i, j, 1]], a[[i, j, 2]])
}

fn jac_at(a: &Array4<f64>, i: usize, j: usize, k: usize) -> Vector3 {
    Vector3::new(a[[i, j, 0, k]], a[[i, j, 1, k]], a[[i, j, 2, k]])
}

impl<B: SurfaceBasis> Surface<B> {
    pub fn from_basis(basis: B, grid: QuadratureGrid) -> Self {
        Self {
            basis,
            grid,
            settings: Settings::default(),
            cache: SurfaceCache::default(),
            dependents: RefCell::new(DependencyRegistry::new()),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn basis(&self) -> &B {
        &self.basis
    }

    pub fn into_basis(self) -> B {
        self.basis
    }

    /// Mutate the coefficient set; caches are dropped and dependents notified afterwards,
    /// whether or not `f` succeeds.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut B) -> Result<R>) -> Result<R> {
        let result = f(&mut self.basis);
        self.invalidate_cache();
        result
    }

    /// Drop every memoized field and notify registered dependents.
    pub fn invalidate_cache(&self) {
        <Self as Dependent>::invalidate_cache(self, 0);
    }

    pub fn grid(&self) -> &QuadratureGrid {
        &self.grid
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn cache(&self) -> &SurfaceCache {
        &self.cache
    }

    pub fn nfp(&self) -> u32 {
        self.basis.nfp()
    }

    pub fn stellsym(&self) -> bool {
        self.basis.stellsym()
    }

    pub fn register_dependent(&self, dependent: &Rc<dyn Dependent>) -> DependentKey {
        self.dependents.borrow_mut().register(dependent)
    }

    pub fn unregister_dependent(&self, key: DependentKey) -> bool {
        self.dependents.borrow_mut().unregister(key)
    }

    fn shape(&self) -> (usize, usize) {
        (self.grid.nphi(), self.grid.ntheta())
    }

    fn points(&self) -> Rc<Vec<SurfacePoint>> {
        self.cache.points.get_or_init(|| {
            log::trace!("evaluating surface on {} grid points", self.grid.len());
            self.grid
                .iter()
                .map(|(_, _, phi, theta)| self.basis.point_at(phi, theta, MAX_ORDER))
                .collect()
        })
    }

    fn field(&self, partial: Partial) -> Array3<f64> {
        let (nphi, ntheta) = self.shape();
        let points = self.points();
        let mut out = Array3::zeros((nphi, ntheta, 3));
        for (idx, p) in points.iter().enumerate() {
            let v = p.get(partial);
            let (i, j) = (idx / ntheta, idx % ntheta);
            out[[i, j, 0]] = v.x;
            out[[i, j, 1]] = v.y;
            out[[i, j, 2]] = v.z;
        }
        out
    }

    fn jacobian_field(&self, partial: Partial) -> Array4<f64> {
        let (nphi, ntheta) = self.shape();
        let mut out = Array4::zeros((nphi, ntheta, 3, self.basis.num_dofs()));
        for (i, j, phi, theta) in self.grid.iter() {
            self.basis
                .jacobian_at(phi, theta, partial, out.slice_mut(s![i, j, .., ..]));
        }
        out
    }

    pub fn gamma(&self) -> Rc<Array3<f64>> {
        self.cache.gamma.get_or_init(|| self.field(Partial::Value))
    }

    pub fn gammadash1(&self) -> Rc<Array3<f64>> {
        self.cache.gammadash1.get_or_init(|| self.field(Partial::Phi))
    }

    pub fn gammadash2(&self) -> Rc<Array3<f64>> {
        self.cache.gammadash2.get_or_init(|| self.field(Partial::Theta))
    }

    pub fn gammadash1dash1(&self) -> Rc<Array3<f64>> {
        self.cache
            .gammadash1dash1
            .get_or_init(|| self.field(Partial::PhiPhi))
    }

    pub fn gammadash1dash2(&self) -> Rc<Array3<f64>> {
        self.cache
            .gammadash1dash2
            .get_or_init(|| self.field(Partial::PhiTheta))
    }

    pub fn gammadash2dash2(&self) -> Rc<Array3<f64>> {
        self.cache
            .gammadash2dash2
            .get_or_init(|| self.field(Partial::ThetaTheta))
    }

    /// `gammadash1 × gammadash2`; not normalized, its norm is the area element.
    pub fn normal(&self) -> Rc<Array3<f64>> {
        self.cache.normal.get_or_init(|| {
            let (nphi, ntheta) = self.shape();
            let d1 = self.gammadash1();
            let d2 = self.gammadash2();
            let mut out = Array3::zeros((nphi, ntheta, 3));
            for i in 0..nphi {
                for j in 0..ntheta {
                    let n = vec_at(&d1, i, j).cross(vec_at(&d2, i, j));
                    out[[i, j, 0]] = n.x;
                    out[[i, j, 1]] = n.y;
                    out[[i, j, 2]] = n.z;
                }
            }
            out
        })
    }

    pub fn unitnormal(&self) -> Result<Rc<Array3<f64>>> {
        self.cache.unitnormal.get_or_try_init(|| {
            let normal = self.normal();
            let mut out = normal.as_ref().clone();
            for mut row in out.rows_mut() {
                let norm = row.dot(&row).sqrt();
                if norm == 0.0 {
                    return Err(TsgError::DegenerateGeometry(
                        "vanishing normal, surface parameterization is singular".into(),
                    ));
                }
                row /= norm;
            }
            Ok(out)
        })
    }

    /// Mean of `‖normal‖` over the grid.
    pub fn area(&self) -> f64 {
        *self.cache.area.get_or_init(|| {
            let normal = self.normal();
            let total: f64 = normal.rows().into_iter().map(|n| n.dot(&n).sqrt()).sum();
            total / self.grid.len() as f64
        })
    }

    /// Mean of `γ · normal / 3` over the grid; negative for left-handed parameterizations.
    pub fn volume(&self) -> f64 {
        *self.cache.volume.get_or_init(|| {
            let gamma = self.gamma();
            let normal = self.normal();
            let total: f64 = gamma
                .rows()
                .into_iter()
                .zip(normal.rows())
                .map(|(g, n)| g.dot(&n) / 3.0)
                .sum();
            total / self.grid.len() as f64
        })
    }

    pub fn dgamma_by_dcoeff(&self) -> Rc<Array4<f64>> {
        self.cache
            .dgamma_by_dcoeff
            .get_or_init(|| self.jacobian_field(Partial::Value))
    }

    pub fn dgammadash1_by_dcoeff(&self) -> Rc<Array4<f64>> {
        self.cache
            .dgammadash1_by_dcoeff
            .get_or_init(|| self.jacobian_field(Partial::Phi))
    }

    pub fn dgammadash2_by_dcoeff(&self) -> Rc<Array4<f64>> {
        self.cache
            .dgammadash2_by_dcoeff
            .get_or_init(|| self.jacobian_field(Partial::Theta))
    }

    pub fn dnormal_by_dcoeff(&self) -> Rc<Array4<f64>> {
        self.cache.dnormal_by_dcoeff.get_or_init(|| {
            let (nphi, ntheta) = self.shape();
            let ndofs = self.basis.num_dofs();
            let d1 = self.gammadash1();
            let d2 = self.gammadash2();
            let dd1 = self.dgammadash1_by_dcoeff();
            let dd2 = self.dgammadash2_by_dcoeff();
            let mut out = Array4::zeros((nphi, ntheta, 3, ndofs));
            for i in 0..nphi {
                for j in 0..ntheta {
                    let (a, b) = (vec_at(&d1, i, j), vec_at(&d2, i, j));
                    for k in 0..ndofs {
                        let dn = jac_at(&dd1, i, j, k).cross(b) + a.cross(jac_at(&dd2, i, j, k));
                        out[[i, j, 0, k]] = dn.x;
                        out[[i, j, 1, k]] = dn.y;
                        out[[i, j, 2, k]] = dn.z;
                    }
                }
            }
            out
        })
    }

    pub fn darea_by_dcoeff(&self) -> Result<Rc<Array1<f64>>> {
        self.cache.darea_by_dcoeff.get_or_try_init(|| {
            let (nphi, ntheta) = self.shape();
            let ndofs = self.basis.num_dofs();
            let normal = self.normal();
            let dnormal = self.dnormal_by_dcoeff();
            let mut out = Array1::zeros(ndofs);
            for i in 0..nphi {
                for j in 0..ntheta {
                    let n = vec_at(&normal, i, j);
                    let norm = n.length();
                    if norm == 0.0 {
                        return Err(TsgError::DegenerateGeometry(format!(
                            "area element vanishes at grid point ({i}, {j})"
                        )));
                    }
                    for k in 0..ndofs {
                        out[k] += n.dot(jac_at(&dnormal, i, j, k)) / norm;
                    }
                }
            }
            Ok(out / self.grid.len() as f64)
        })
    }

    pub fn dvolume_by_dcoeff(&self) -> Rc<Array1<f64>> {
        self.cache.dvolume_by_dcoeff.get_or_init(|| {
            let (nphi, ntheta) = self.shape();
            let ndofs = self.basis.num_dofs();
            let gamma = self.gamma();
            let normal = self.normal();
            let dgamma = self.dgamma_by_dcoeff();
            let dnormal = self.dnormal_by_dcoeff();
            let mut out = Array1::zeros(ndofs);
            for i in 0..nphi {
                for j in 0..ntheta {
                    let (g, n) = (vec_at(&gamma, i, j), vec_at(&normal, i, j));
                    for k in 0..ndofs {
                        let dg = jac_at(&dgamma, i, j, k);
                        let dn = jac_at(&dnormal, i, j, k);
                        out[k] += (dg.dot(n) + g.dot(dn)) / 3.0;
                    }
                }
            }
            out / self.grid.len() as f64
        })
    }

    /// Cross-sectional area averaged over the toroidal angle.
    ///
    /// At every grid point the θ-derivative of Z at fixed cylindrical angle is
    /// recovered from the Jacobian of `(φ, θ) → (cylindrical angle, θ)`, so no
    /// cross-section root finding is needed.
    pub fn mean_cross_sectional_area(&self) -> Result<f64> {
        let area = self.cache.mean_cross_sectional_area.get_or_try_init(|| {
            let (nphi, ntheta) = self.shape();
            let gamma = self.gamma();
            let d1 = self.gammadash1();
            let d2 = self.gammadash2();
            let mut total = 0.0;
            for i in 0..nphi {
                for j in 0..ntheta {
                    let (p, a, b) = (vec_at(&gamma, i, j), vec_at(&d1, i, j), vec_at(&d2, i, j));
                    let r2 = p.x * p.x + p.y * p.y;
                    if r2 <= self.settings.axis_eps {
                        return Err(TsgError::DegenerateGeometry(format!(
                            "grid point ({i}, {j}) lies on the z-axis"
                        )));
                    }
                    let j00 = (p.x * a.y - p.y * a.x) / r2;
                    let j01 = (p.x * b.y - p.y * b.x) / r2;
                    if j00 == 0.0 {
                        return Err(TsgError::DegenerateGeometry(format!(
                            "cylindrical angle is stationary in phi at grid point ({i}, {j})"
                        )));
                    }
                    let dz_dtheta = b.z - a.z * j01 / j00;
                    total += r2.sqrt() * dz_dtheta * j00;
                }
            }
            Ok((total / self.grid.len() as f64).abs() / (2.0 * PI))
        })?;
        Ok(*area)
    }

    /// `sqrt(Ā / π)` for the mean cross-sectional area `Ā`.
    pub fn minor_radius(&self) -> Result<f64> {
        Ok((self.mean_cross_sectional_area()? / PI).sqrt())
    }

    /// Radius of the torus with the same volume and minor radius.
    pub fn major_radius(&self) -> Result<f64> {
        let r = self.minor_radius()?;
        if r == 0.0 {
            return Err(TsgError::DegenerateGeometry(
                "zero mean cross-sectional area".into(),
            ));
        }
        Ok(self.volume().abs() / (2.0 * PI * PI * r * r))
    }

    pub fn aspect_ratio(&self) -> Result<f64> {
        Ok(self.major_radius()? / self.minor_radius()?)
    }

    /// Positions at arbitrary `(phi, theta)` pairs, shape `(n, 3)`.
    pub fn gamma_at(&self, params: &[(f64, f64)]) -> Array2<f64> {
        let mut out = Array2::zeros((params.len(), 3));
        for (row, &(phi, theta)) in params.iter().enumerate() {
            let p = self.basis.gamma_at(phi, theta);
            out[[row, 0]] = p.x;
            out[[row, 1]] = p.y;
            out[[row, 2]] = p.z;
        }
        out
    }

    /// Cross-section at physical toroidal angle `phi` (radians), shape `(theta_resolution, 3)`.
    ///
    /// `theta_resolution` defaults to the grid's θ count; `varphi_resolution`
    /// defaults to the grid's φ count, but never fewer than
    /// [`cross_section::MIN_VARPHI_RESOLUTION`] samples.
    pub fn cross_section(
        &self,
        phi: f64,
        theta_resolution: Option<usize>,
        varphi_resolution: Option<usize>,
    ) -> Result<Array2<f64>> {
        let ntheta = theta_resolution.unwrap_or_else(|| self.grid.ntheta());
        let thetas = tsg_math::grid::linspace_periodic(ntheta, 1.0);
        self.cross_section_at_thetas(phi, &thetas, varphi_resolution)
    }

    pub fn cross_section_at_thetas(
        &self,
        phi: f64,
        thetas: &[f64],
        varphi_resolution: Option<usize>,
    ) -> Result<Array2<f64>> {
        let nres = varphi_resolution
            .unwrap_or_else(|| self.grid.nphi().max(cross_section::MIN_VARPHI_RESOLUTION));
        cross_section::cross_section_at_thetas(&self.basis, &self.settings, phi, thetas, nres)
    }

    /// Fit the coefficients so that `gamma()` matches `target` in the least-squares sense.
    ///
    /// Every representation is linear and homogeneous in its dofs, so this is a single
    /// linear solve. Returns the residual norm.
    pub fn least_squares_fit(&mut self, target: ArrayView3<f64>) -> Result<f64> {
        let (nphi, ntheta) = self.shape();
        let (d0, d1, d2) = target.dim();
        TsgError::check_len(nphi, d0)?;
        TsgError::check_len(ntheta, d1)?;
        TsgError::check_len(3, d2)?;

        let ndofs = self.basis.num_dofs();
        let jac = self.dgamma_by_dcoeff();
        let rows = nphi * ntheta * 3;
        let a = Array2::from_shape_vec((rows, ndofs), jac.iter().copied().collect()).map_err(
            |_| TsgError::Dimension {
                expected: rows * ndofs,
                got: jac.len(),
            },
        )?;
        let b = Array1::from_iter(target.iter().copied());

        let fit = lstsq::solve(a.view(), b.view(), self.settings.lstsq_rcond)?;
        log::debug!(
            "least-squares fit of {} dofs to {} samples: rank {}, residual {:e}",
            ndofs,
            rows,
            fit.rank,
            fit.residual
        );
        let dofs = fit.solution.to_vec();
        self.set_dofs(&dofs)?;
        Ok(fit.residual)
    }
}

impl<B: SurfaceBasis> Optimizable for Surface<B> {
    fn num_dofs(&self) -> usize {
        self.basis.num_dofs()
    }

    fn get_dofs(&self) -> Vec<f64> {
        self.basis.dofs()
    }

    fn set_dofs(&mut self, dofs: &[f64]) -> Result<()> {
        TsgError::check_len(self.basis.num_dofs(), dofs.len())?;
        self.modify(|basis| basis.set_dofs(dofs))
    }

    fn dof_names(&self) -> Vec<String> {
        self.basis.dof_names()
    }
}

impl<B> Dependent for Surface<B> {
    fn invalidate_cache(&self, depth: usize) {
        self.cache.invalidate_all();
        DependencyRegistry::notify(&self.dependents, depth);
    }
}

impl<B: SurfaceBasis> Invalidate for Surface<B> {
    fn invalidate_cache(&self) {
        Surface::invalidate_cache(self);
    }
}
