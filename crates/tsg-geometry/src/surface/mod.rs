//! Toroidal surfaces and their Fourier coefficient sets.

use ndarray::ArrayViewMut2;
use tsg_core::{Invalidate, Optimizable, Result};
use tsg_math::{Point3, QuadratureGrid};

use crate::basis::{Partial, SurfacePoint};

/// A coefficient set that can be evaluated as a toroidal surface.
///
/// Angles are normalized: `phi` and `theta` in `[0, 1)` cover one full turn.
pub trait SurfaceBasis: Send + Sync {
    fn nfp(&self) -> u32;

    fn stellsym(&self) -> bool;

    fn num_dofs(&self) -> usize;

    fn dofs(&self) -> Vec<f64>;

    fn set_dofs(&mut self, dofs: &[f64]) -> Result<()>;

    fn dof_names(&self) -> Vec<String>;

    /// Position and partials up to `max_order` at `(phi, theta)`.
    fn point_at(&self, phi: f64, theta: f64, max_order: usize) -> SurfacePoint;

    /// Write the `(3, num_dofs)` Jacobian of `partial` with respect to the dofs into `out`.
    fn jacobian_at(&self, phi: f64, theta: f64, partial: Partial, out: ArrayViewMut2<f64>);

    fn gamma_at(&self, phi: f64, theta: f64) -> Point3 {
        self.point_at(phi, theta, 0).gamma
    }
}

/// Forwards the dof bookkeeping and evaluation of a [`SurfaceBasis`] to its `table` field.
macro_rules! delegate_table_basis {
    ($ty:ty) => {
        impl $crate::surface::SurfaceBasis for $ty {
            fn nfp(&self) -> u32 {
                self.table.nfp()
            }

            fn stellsym(&self) -> bool {
                self.table.stellsym()
            }

            fn num_dofs(&self) -> usize {
                self.table.num_dofs()
            }

            fn dofs(&self) -> Vec<f64> {
                self.table.dofs()
            }

            fn set_dofs(&mut self, dofs: &[f64]) -> tsg_core::Result<()> {
                self.table.set_dofs(dofs)
            }

            fn dof_names(&self) -> Vec<String> {
                self.table.dof_names()
            }

            fn point_at(
                &self,
                phi: f64,
                theta: f64,
                max_order: usize,
            ) -> $crate::basis::SurfacePoint {
                self.table.point_at(phi, theta, max_order)
            }

            fn jacobian_at(
                &self,
                phi: f64,
                theta: f64,
                partial: $crate::basis::Partial,
                out: ndarray::ArrayViewMut2<f64>,
            ) {
                self.table.jacobian_at(phi, theta, partial, out)
            }
        }
    };
}
pub(crate) use delegate_table_basis;

pub mod cross_section;
mod garabedian;
mod rzfourier;
mod sampled;
mod xyzfourier;

pub use garabedian::{Garabedian, SurfaceGarabedian};
pub use rzfourier::{RzFourier, SurfaceRZFourier};
pub use sampled::{Surface, SurfaceCache};
pub use xyzfourier::{SurfaceXYZFourier, XyzFourier};

/// Any of the supported surface representations.
#[derive(Debug, Clone)]
pub enum AnySurface {
    RZFourier(SurfaceRZFourier),
    XYZFourier(SurfaceXYZFourier),
    Garabedian(SurfaceGarabedian),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            AnySurface::RZFourier($s) => $body,
            AnySurface::XYZFourier($s) => $body,
            AnySurface::Garabedian($s) => $body,
        }
    };
}

impl AnySurface {
    pub fn grid(&self) -> &QuadratureGrid {
        dispatch!(self, s => s.grid())
    }

    pub fn nfp(&self) -> u32 {
        dispatch!(self, s => s.nfp())
    }

    pub fn stellsym(&self) -> bool {
        dispatch!(self, s => s.stellsym())
    }

    pub fn area(&self) -> f64 {
        dispatch!(self, s => s.area())
    }

    pub fn volume(&self) -> f64 {
        dispatch!(self, s => s.volume())
    }

    pub fn aspect_ratio(&self) -> Result<f64> {
        dispatch!(self, s => s.aspect_ratio())
    }

    pub fn cross_section(
        &self,
        phi: f64,
        theta_resolution: Option<usize>,
        varphi_resolution: Option<usize>,
    ) -> Result<ndarray::Array2<f64>> {
        dispatch!(self, s => s.cross_section(phi, theta_resolution, varphi_resolution))
    }

    /// Equivalent RZFourier surface on the same grid.
    pub fn to_rz_fourier(&self) -> Result<SurfaceRZFourier> {
        match self {
            AnySurface::RZFourier(s) => Ok(s.clone()),
            AnySurface::XYZFourier(s) => crate::convert::xyz_to_rz(s),
            AnySurface::Garabedian(s) => Ok(s.to_rz_fourier()),
        }
    }
}

impl Optimizable for AnySurface {
    fn num_dofs(&self) -> usize {
        dispatch!(self, s => s.num_dofs())
    }

    fn get_dofs(&self) -> Vec<f64> {
        dispatch!(self, s => s.get_dofs())
    }

    fn set_dofs(&mut self, dofs: &[f64]) -> Result<()> {
        dispatch!(self, s => s.set_dofs(dofs))
    }

    fn dof_names(&self) -> Vec<String> {
        dispatch!(self, s => s.dof_names())
    }
}

impl Invalidate for AnySurface {
    fn invalidate_cache(&self) {
        dispatch!(self, s => s.invalidate_cache())
    }
}

impl From<SurfaceRZFourier> for AnySurface {
    fn from(s: SurfaceRZFourier) -> Self {
        AnySurface::RZFourier(s)
    }
}

impl From<SurfaceXYZFourier> for AnySurface {
    fn from(s: SurfaceXYZFourier) -> Self {
        AnySurface::XYZFourier(s)
    }
}

impl From<SurfaceGarabedian> for AnySurface {
    fn from(s: SurfaceGarabedian) -> Self {
        AnySurface::Garabedian(s)
    }
}
