//! Surfaces given by cylindrical `R(φ, θ)` and `Z(φ, θ)` Fourier series.
//!
//! ```text
//! R = Σ rc[m,n] cos(2π(mθ − n·nfp·φ)) + rs[m,n] sin(...)
//! Z = Σ zc[m,n] cos(...)              + zs[m,n] sin(...)
//! ```
//!
//! with `m ∈ [0, mpol]`, `n ∈ [−ntor, ntor]`. Under stellarator symmetry `rs` and
//! `zc` do not exist.

use serde::{Deserialize, Serialize};
use tsg_core::Result;
use tsg_math::QuadratureGrid;

use super::{delegate_table_basis, Garabedian, Surface, SurfaceGarabedian};
use crate::basis::{Component, Parity};
use crate::table::{CoefficientBlock, FourierTable};

const COMPONENTS: [(Component, char); 2] = [(Component::Xhat, 'r'), (Component::Z, 'z')];

/// Coefficients of an RZFourier surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RzFourier {
    table: FourierTable,
}

delegate_table_basis!(RzFourier);

impl RzFourier {
    /// Circular torus with `R0 = 1` and minor radius `0.1`.
    pub fn new(nfp: u32, stellsym: bool, mpol: usize, ntor: usize) -> Result<Self> {
        let mut rz = Self::zeros(nfp, stellsym, mpol, ntor)?;
        rz.set_rc(0, 0, 1.0)?;
        if mpol >= 1 {
            rz.set_rc(1, 0, 0.1)?;
            rz.set_zs(1, 0, 0.1)?;
        }
        Ok(rz)
    }

    pub fn zeros(nfp: u32, stellsym: bool, mpol: usize, ntor: usize) -> Result<Self> {
        Ok(Self {
            table: FourierTable::new(nfp, stellsym, mpol, ntor, &COMPONENTS)?,
        })
    }

    pub fn mpol(&self) -> usize {
        self.table.mpol()
    }

    pub fn ntor(&self) -> usize {
        self.table.ntor()
    }

    pub fn table(&self) -> &FourierTable {
        &self.table
    }

    pub fn rc(&self, m: i32, n: i32) -> Result<f64> {
        self.table.get(Component::Xhat, Parity::Cos, m, n)
    }

    pub fn rs(&self, m: i32, n: i32) -> Result<f64> {
        self.table.get(Component::Xhat, Parity::Sin, m, n)
    }

    pub fn zc(&self, m: i32, n: i32) -> Result<f64> {
        self.table.get(Component::Z, Parity::Cos, m, n)
    }

    pub fn zs(&self, m: i32, n: i32) -> Result<f64> {
        self.table.get(Component::Z, Parity::Sin, m, n)
    }

    pub fn set_rc(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.table.set(Component::Xhat, Parity::Cos, m, n, value)
    }

    pub fn set_rs(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.table.set(Component::Xhat, Parity::Sin, m, n, value)
    }

    pub fn set_zc(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.table.set(Component::Z, Parity::Cos, m, n, value)
    }

    pub fn set_zs(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.table.set(Component::Z, Parity::Sin, m, n, value)
    }

    /// The full `[m, n + ntor]` array of one coefficient family, if present.
    pub fn block(&self, component: Component, parity: Parity) -> Option<&CoefficientBlock> {
        self.table.block(component, parity)
    }

    pub(crate) fn rc_or_zero(&self, m: i32, n: i32) -> f64 {
        self.table.get_or_zero(Component::Xhat, Parity::Cos, m, n)
    }

    pub(crate) fn zs_or_zero(&self, m: i32, n: i32) -> f64 {
        self.table.get_or_zero(Component::Z, Parity::Sin, m, n)
    }

    pub fn change_resolution(&mut self, mpol: usize, ntor: usize) {
        self.table.change_resolution(mpol, ntor);
    }
}

/// A surface sampled from RZFourier coefficients.
pub type SurfaceRZFourier = Surface<RzFourier>;

impl Surface<RzFourier> {
    pub fn new(
        nfp: u32,
        stellsym: bool,
        mpol: usize,
        ntor: usize,
        grid: QuadratureGrid,
    ) -> Result<Self> {
        Ok(Self::from_basis(RzFourier::new(nfp, stellsym, mpol, ntor)?, grid))
    }

    /// Axisymmetric default torus, `mpol = 1`, `ntor = 0`, on a 32×32 full-turn grid.
    pub fn axisymmetric() -> Result<Self> {
        Self::new(1, true, 1, 0, QuadratureGrid::uniform(32, 32)?)
    }

    pub fn mpol(&self) -> usize {
        self.basis().mpol()
    }

    pub fn ntor(&self) -> usize {
        self.basis().ntor()
    }

    pub fn rc(&self, m: i32, n: i32) -> Result<f64> {
        self.basis().rc(m, n)
    }

    pub fn rs(&self, m: i32, n: i32) -> Result<f64> {
        self.basis().rs(m, n)
    }

    pub fn zc(&self, m: i32, n: i32) -> Result<f64> {
        self.basis().zc(m, n)
    }

    pub fn zs(&self, m: i32, n: i32) -> Result<f64> {
        self.basis().zs(m, n)
    }

    pub fn set_rc(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.modify(|b| b.set_rc(m, n, value))
    }

    pub fn set_rs(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.modify(|b| b.set_rs(m, n, value))
    }

    pub fn set_zc(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.modify(|b| b.set_zc(m, n, value))
    }

    pub fn set_zs(&mut self, m: i32, n: i32, value: f64) -> Result<()> {
        self.modify(|b| b.set_zs(m, n, value))
    }

    /// Re-map the coefficients into an `mpol × ntor` window.
    pub fn change_resolution(&mut self, mpol: usize, ntor: usize) -> Result<()> {
        self.modify(|b| {
            b.change_resolution(mpol, ntor);
            Ok(())
        })
    }

    /// Garabedian representation on the same grid; stellarator-symmetric surfaces only.
    pub fn to_garabedian(&self) -> Result<SurfaceGarabedian> {
        let delta = Garabedian::from_rz(self.basis())?;
        Ok(Surface::from_basis(delta, self.grid().clone()).with_settings(self.settings()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceBasis;

    #[test]
    fn test_default_torus() {
        let rz = RzFourier::new(1, true, 1, 0).unwrap();
        assert_eq!(rz.dofs(), vec![1.0, 0.1, 0.1]);
        assert_eq!(rz.dof_names(), vec!["rc(0,0)", "rc(1,0)", "zs(1,0)"]);
    }

    #[test]
    fn test_dof_layout_stellsym() {
        let rz = RzFourier::new(1, true, 3, 1).unwrap();
        assert_eq!(rz.num_dofs(), 21);
        let names = rz.dof_names();
        assert_eq!(&names[..4], &["rc(0,0)", "rc(0,1)", "rc(1,-1)", "rc(1,0)"]);
        assert_eq!(names[11], "zs(0,1)");
        assert_eq!(names[12], "zs(1,-1)");
    }

    #[test]
    fn test_dof_layout_non_stellsym() {
        let rz = RzFourier::new(10, false, 1, 3).unwrap();
        // rc, zc: 7 + 4 each; rs, zs: 7 + 3 each
        assert_eq!(rz.num_dofs(), 2 * 11 + 2 * 10);
        let names = rz.dof_names();
        assert_eq!(names[11], "rs(0,1)");
        assert_eq!(names[21], "zc(0,0)");
        assert!(rz.rs(1, 0).is_ok());
    }

    #[test]
    fn test_stellsym_has_no_rs() {
        let rz = RzFourier::new(2, true, 3, 2).unwrap();
        assert!(rz.rs(1, 0).is_err());
        assert!(rz.block(Component::Z, Parity::Cos).is_none());
        let zs = rz.block(Component::Z, Parity::Sin).unwrap();
        assert_eq!(zs.values.dim(), (4, 5));
    }

    #[test]
    fn test_set_dofs_roundtrip() {
        let mut rz = RzFourier::new(3, false, 2, 2).unwrap();
        let dofs: Vec<f64> = (0..rz.num_dofs()).map(|i| 0.01 * i as f64).collect();
        rz.set_dofs(&dofs).unwrap();
        assert_eq!(rz.dofs(), dofs);
        assert_eq!(rz.zs(0, 1).unwrap(), dofs[rz.num_dofs() - 12]);
    }
}
