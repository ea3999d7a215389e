//! Surfaces given in a frame rotating with the toroidal angle.
//!
//! `x̂, ŷ, z` are Fourier series in `(φ, θ)` with the same mode window as the RZ
//! representation, and the Cartesian position is `(x̂ cos Φ − ŷ sin Φ, x̂ sin Φ + ŷ cos Φ, z)`
//! with `Φ = 2πφ`. The surface's own `φ` is generally not the cylindrical angle.

use serde::{Deserialize, Serialize};
use tsg_core::Result;
use tsg_math::QuadratureGrid;

use super::{delegate_table_basis, Surface, SurfaceRZFourier};
use crate::basis::{Component, Parity};
use crate::table::{CoefficientBlock, FourierTable};

const COMPONENTS: [(Component, char); 3] = [
    (Component::Xhat, 'x'),
    (Component::Yhat, 'y'),
    (Component::Z, 'z'),
];

/// Coefficients `xc, ys, zs` and, without stellarator symmetry, `xs, yc, zc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XyzFourier {
    table: FourierTable,
}

delegate_table_basis!(XyzFourier);

impl XyzFourier {
    /// Circular torus with major radius 1 and minor radius 0.1.
    pub fn new(nfp: u32, stellsym: bool, mpol: usize, ntor: usize) -> Result<Self> {
        let mut xyz = Self::zeros(nfp, stellsym, mpol, ntor)?;
        xyz.set(Component::Xhat, Parity::Cos, 0, 0, 1.0)?;
        if mpol >= 1 {
            xyz.set(Component::Xhat, Parity::Cos, 1, 0, 0.1)?;
            xyz.set(Component::Z, Parity::Sin, 1, 0, 0.1)?;
        }
        Ok(xyz)
    }

    pub fn zeros(nfp: u32, stellsym: bool, mpol: usize, ntor: usize) -> Result<Self> {
        Ok(Self {
            table: FourierTable::new(nfp, stellsym, mpol, ntor, &COMPONENTS)?,
        })
    }

    /// Circular torus of the given radii.
    pub fn torus(
        nfp: u32,
        stellsym: bool,
        mpol: usize,
        ntor: usize,
        major_radius: f64,
        minor_radius: f64,
    ) -> Result<Self> {
        let mut xyz = Self::zeros(nfp, stellsym, mpol.max(1), ntor)?;
        xyz.set(Component::Xhat, Parity::Cos, 0, 0, major_radius)?;
        xyz.set(Component::Xhat, Parity::Cos, 1, 0, minor_radius)?;
        xyz.set(Component::Z, Parity::Sin, 1, 0, minor_radius)?;
        Ok(xyz)
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

    pub fn get(&self, component: Component, parity: Parity, m: i32, n: i32) -> Result<f64> {
        self.table.get(component, parity, m, n)
    }

    pub fn set(
        &mut self,
        component: Component,
        parity: Parity,
        m: i32,
        n: i32,
        value: f64,
    ) -> Result<()> {
        self.table.set(component, parity, m, n, value)
    }

    pub fn block(&self, component: Component, parity: Parity) -> Option<&CoefficientBlock> {
        self.table.block(component, parity)
    }
}

/// A surface sampled from XYZFourier coefficients.
pub type SurfaceXYZFourier = Surface<XyzFourier>;

impl Surface<XyzFourier> {
    pub fn new(
        nfp: u32,
        stellsym: bool,
        mpol: usize,
        ntor: usize,
        grid: QuadratureGrid,
    ) -> Result<Self> {
        Ok(Self::from_basis(XyzFourier::new(nfp, stellsym, mpol, ntor)?, grid))
    }

    pub fn mpol(&self) -> usize {
        self.basis().mpol()
    }

    pub fn ntor(&self) -> usize {
        self.basis().ntor()
    }

    pub fn coefficient(&self, component: Component, parity: Parity, m: i32, n: i32) -> Result<f64> {
        self.basis().get(component, parity, m, n)
    }

    pub fn set_coefficient(
        &mut self,
        component: Component,
        parity: Parity,
        m: i32,
        n: i32,
        value: f64,
    ) -> Result<()> {
        self.modify(|b| b.set(component, parity, m, n, value))
    }

    /// Least-squares RZFourier fit through this surface's cross-sections; see
    /// [`crate::convert::xyz_to_rz`].
    pub fn to_rz_fourier(&self) -> Result<SurfaceRZFourier> {
        crate::convert::xyz_to_rz(self)
    }
}
