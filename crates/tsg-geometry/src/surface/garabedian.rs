//! Garabedian Δ-coefficient representation of stellarator-symmetric surfaces.
//!
//! `R + iZ = e^{iθ} Σ Δ(m,n) e^{−i(mθ − n·nfp·φ)}` (angles in radians), which is a
//! linear reparameterization of the stellarator-symmetric RZFourier coefficients.
//! Evaluation goes through the equivalent RZFourier set, kept in sync with Δ.

use ndarray::{Array1, Array2, ArrayViewMut2};
use serde::{Deserialize, Serialize};
use tsg_core::{Result, TsgError};
use tsg_math::QuadratureGrid;

use super::{RzFourier, Surface, SurfaceBasis, SurfaceRZFourier};
use crate::basis::{Partial, SurfacePoint};

/// Δ(m, n) for `m ∈ [mmin, mmax]`, `n ∈ [nmin, nmax]`, stored at `[m − mmin, n − nmin]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGarabedian", into = "RawGarabedian")]
pub struct Garabedian {
    nfp: u32,
    mmin: i32,
    mmax: i32,
    nmin: i32,
    nmax: i32,
    delta: Array2<f64>,
    rz: RzFourier,
    /// `d(rz dofs) / d(Δ dofs)`; depends on the window only.
    map: Array2<f64>,
}

#[derive(Serialize, Deserialize)]
struct RawGarabedian {
    nfp: u32,
    mmin: i32,
    mmax: i32,
    nmin: i32,
    nmax: i32,
    delta: Array2<f64>,
}

impl TryFrom<RawGarabedian> for Garabedian {
    type Error = TsgError;

    fn try_from(raw: RawGarabedian) -> Result<Self> {
        let mut g = Self::zeros(raw.nfp, raw.mmin, raw.mmax, raw.nmin, raw.nmax)?;
        if raw.delta.dim() != g.delta.dim() {
            return Err(TsgError::InvalidParameter(format!(
                "delta has shape {:?}, window requires {:?}",
                raw.delta.dim(),
                g.delta.dim()
            )));
        }
        let dofs: Vec<f64> = raw.delta.iter().copied().collect();
        g.set_dofs(&dofs)?;
        Ok(g)
    }
}

impl From<Garabedian> for RawGarabedian {
    fn from(g: Garabedian) -> Self {
        Self {
            nfp: g.nfp,
            mmin: g.mmin,
            mmax: g.mmax,
            nmin: g.nmin,
            nmax: g.nmax,
            delta: g.delta,
        }
    }
}

fn validate_window(mmin: i32, mmax: i32, nmin: i32, nmax: i32) -> Result<()> {
    if mmax < 1 || mmin > 0 {
        return Err(TsgError::InvalidParameter(format!(
            "Garabedian window needs mmin <= 0 and mmax >= 1, got [{mmin}, {mmax}]"
        )));
    }
    if nmax < nmin {
        return Err(TsgError::InvalidParameter(format!(
            "Garabedian window has nmax {nmax} < nmin {nmin}"
        )));
    }
    Ok(())
}

impl Garabedian {
    /// Circular torus `Δ(1,0) = 1`, `Δ(0,0) = 0.1` in the given window.
    pub fn new(nfp: u32, mmin: i32, mmax: i32, nmin: i32, nmax: i32) -> Result<Self> {
        let mut g = Self::zeros(nfp, mmin, mmax, nmin, nmax)?;
        if (nmin..=nmax).contains(&0) {
            g.set(1, 0, 1.0)?;
            g.set(0, 0, 0.1)?;
        }
        Ok(g)
    }

    pub fn zeros(nfp: u32, mmin: i32, mmax: i32, nmin: i32, nmax: i32) -> Result<Self> {
        validate_window(mmin, mmax, nmin, nmax)?;
        let shape = ((mmax - mmin + 1) as usize, (nmax - nmin + 1) as usize);
        let mut g = Self {
            nfp,
            mmin,
            mmax,
            nmin,
            nmax,
            delta: Array2::zeros(shape),
            rz: RzFourier::zeros(nfp, true, 1, 0)?,
            map: Array2::zeros((0, 0)),
        };
        g.rz = g.derived_rz()?;
        g.map = g.linear_map()?;
        Ok(g)
    }

    /// Garabedian coefficients of a stellarator-symmetric RZFourier set.
    ///
    /// The window is `m ∈ [min(0, 1 − mpol), mpol + 1]`, `n ∈ [−ntor, ntor]`.
    pub fn from_rz(rz: &RzFourier) -> Result<Self> {
        if !rz.stellsym() {
            return Err(TsgError::Unsupported(
                "Garabedian representation requires stellarator symmetry".into(),
            ));
        }
        let mpol = rz.mpol() as i32;
        let ntor = rz.ntor() as i32;
        let (mmin, mmax) = (0i32.min(1 - mpol), mpol + 1);
        let mut g = Self::zeros(rz.nfp(), mmin, mmax, -ntor, ntor)?;
        for m in mmin..=mmax {
            for n in -ntor..=ntor {
                let mut value = 0.0;
                if m >= 1 {
                    value += 0.5 * (rz.rc_or_zero(m - 1, n) - rz.zs_or_zero(m - 1, n));
                }
                if m <= 1 {
                    value += 0.5 * (rz.rc_or_zero(1 - m, -n) + rz.zs_or_zero(1 - m, -n));
                }
                let idx = g.index(m, n);
                g.delta[idx] = value;
            }
        }
        g.rz = g.derived_rz()?;
        Ok(g)
    }

    pub fn window(&self) -> (i32, i32, i32, i32) {
        (self.mmin, self.mmax, self.nmin, self.nmax)
    }

    pub fn delta_array(&self) -> &Array2<f64> {
        &self.delta
    }

    /// The equivalent RZFourier coefficients.
    pub fn rz(&self) -> &RzFourier {
        &self.rz
    }

    fn in_window(&self, m: i32, n: i32) -> bool {
        (self.mmin..=self.mmax).contains(&m) && (self.nmin..=self.nmax).contains(&n)
    }

    fn index(&self, m: i32, n: i32) -> [usize; 2] {
        [(m - self.mmin) as usize, (n - self.nmin) as usize]
    }

    fn get_or_zero(&self, m: i32, n: i32) -> f64 {
        if self.in_window(m, n) {
            self.delta[self.index(m, n)]
        } else {
            0.0
        }
    }

    pub fn get(&self, m: i32, n: i32) -> Result<f64> {
        if !self.in_window(m, n) {
            return Err(TsgError::InvalidParameter(format!(
                "Delta({m},{n}) outside window m in [{}, {}], n in [{}, {}]",
                self.mmin, self.mmax, self.nmin, self.nmax
            )));
        }
        Ok(self.delta[self.index(m, n)])
    }

    pub fn set(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        if !self.in_window(m, n) {
            return Err(TsgError::InvalidParameter(format!(
                "Delta({m},{n}) outside window m in [{}, {}], n in [{}, {}]",
                self.mmin, self.mmax, self.nmin, self.nmax
            )));
        }
        let idx = self.index(m, n);
        self.delta[idx] = value;
        self.rz = self.derived_rz()?;
        Ok(())
    }

    /// RZFourier coefficients of the current Δ.
    ///
    /// `rc(0,0) = Δ(1,0)`; otherwise `rc = Δ(1−m,−n) + Δ(1+m,n)` and
    /// `zs = Δ(1−m,−n) − Δ(1+m,n)`, with Δ outside the window read as zero.
    fn derived_rz(&self) -> Result<RzFourier> {
        let mpol = 1i32.max(self.mmax - 1).max(1 - self.mmin);
        let ntor = self.nmax.max(-self.nmin);
        let mut rz = RzFourier::zeros(self.nfp, true, mpol as usize, ntor as usize)?;
        rz.set_rc(0, 0, self.get_or_zero(1, 0))?;
        for m in 0..=mpol {
            let nstart = if m == 0 { 1 } else { -ntor };
            for n in nstart..=ntor {
                let d1 = self.get_or_zero(1 - m, -n);
                let d2 = self.get_or_zero(1 + m, n);
                rz.set_rc(m, n, d1 + d2)?;
                rz.set_zs(m, n, d1 - d2)?;
            }
        }
        Ok(rz)
    }

    /// Column `j` holds the RZ dofs produced by the `j`-th unit Δ vector.
    fn linear_map(&self) -> Result<Array2<f64>> {
        let ndelta = self.delta.len();
        let mut unit = self.clone();
        let mut map = Array2::zeros((self.rz.num_dofs(), ndelta));
        for j in 0..ndelta {
            unit.delta.fill(0.0);
            if let Some(v) = unit.delta.iter_mut().nth(j) {
                *v = 1.0;
            }
            let column = Array1::from_vec(unit.derived_rz()?.dofs());
            map.column_mut(j).assign(&column);
        }
        Ok(map)
    }
}

impl SurfaceBasis for Garabedian {
    fn nfp(&self) -> u32 {
        self.nfp
    }

    fn stellsym(&self) -> bool {
        true
    }

    fn num_dofs(&self) -> usize {
        self.delta.len()
    }

    fn dofs(&self) -> Vec<f64> {
        self.delta.iter().copied().collect()
    }

    fn set_dofs(&mut self, dofs: &[f64]) -> Result<()> {
        TsgError::check_len(self.delta.len(), dofs.len())?;
        for (d, &v) in self.delta.iter_mut().zip(dofs) {
            *d = v;
        }
        self.rz = self.derived_rz()?;
        Ok(())
    }

    fn dof_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.delta.len());
        for m in self.mmin..=self.mmax {
            for n in self.nmin..=self.nmax {
                names.push(format!("Delta({m},{n})"));
            }
        }
        names
    }

    fn point_at(&self, phi: f64, theta: f64, max_order: usize) -> SurfacePoint {
        self.rz.point_at(phi, theta, max_order)
    }

    fn jacobian_at(&self, phi: f64, theta: f64, partial: Partial, mut out: ArrayViewMut2<f64>) {
        let mut rz_jac = Array2::zeros((3, self.rz.num_dofs()));
        self.rz.jacobian_at(phi, theta, partial, rz_jac.view_mut());
        out.assign(&rz_jac.dot(&self.map));
    }
}

/// A surface sampled from Garabedian coefficients.
pub type SurfaceGarabedian = Surface<Garabedian>;

impl Surface<Garabedian> {
    pub fn new(
        nfp: u32,
        mmin: i32,
        mmax: i32,
        nmin: i32,
        nmax: i32,
        grid: QuadratureGrid,
    ) -> Result<Self> {
        Ok(Self::from_basis(
            Garabedian::new(nfp, mmin, mmax, nmin, nmax)?,
            grid,
        ))
    }

    pub fn delta(&self, m: i32, n: i32) -> Result<f64> {
        self.basis().get(m, n)
    }

    pub fn set_delta(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.modify(|b| b.set(m, n, value))
    }

    /// The equivalent RZFourier surface on the same grid.
    pub fn to_rz_fourier(&self) -> SurfaceRZFourier {
        Surface::from_basis(self.basis().rz().clone(), self.grid().clone())
            .with_settings(self.settings())
    }
}
