//! Conversions between surface representations.

use std::f64::consts::TAU;

use ndarray::{Array2, Array3};
use rayon::prelude::*;
use tsg_core::Result;

use crate::surface::cross_section::{cross_section_at_thetas, MIN_VARPHI_RESOLUTION};
use crate::surface::{
    RzFourier, Surface, SurfaceBasis, SurfaceGarabedian, SurfaceRZFourier, SurfaceXYZFourier,
};

/// Fit an RZFourier surface through the cross-sections of an XYZFourier surface.
///
/// For every grid φ the XYZ surface is cut at the physical angle `2πφ` through the
/// grid θ values; an RZ surface with the same resolution, symmetry and grid is then
/// least-squares fitted to those points. When the RZ basis interpolates the grid
/// (one field period with `2·ntor + 1` φ points and `2·mpol + 1` θ points, no
/// stellarator symmetry) the fit is exact at the quadrature points.
pub fn xyz_to_rz(surface: &SurfaceXYZFourier) -> Result<SurfaceRZFourier> {
    let grid = surface.grid().clone();
    let settings = surface.settings();
    let basis = surface.basis();
    let nres = grid.nphi().max(MIN_VARPHI_RESOLUTION);

    let sections = grid
        .phi_points()
        .par_iter()
        .map(|&phi| cross_section_at_thetas(basis, &settings, TAU * phi, grid.theta_points(), nres))
        .collect::<Result<Vec<Array2<f64>>>>()?;

    let mut target = Array3::zeros((grid.nphi(), grid.ntheta(), 3));
    for (i, section) in sections.iter().enumerate() {
        target.slice_mut(ndarray::s![i, .., ..]).assign(section);
    }

    let rz = RzFourier::zeros(basis.nfp(), basis.stellsym(), basis.mpol(), basis.ntor())?;
    let mut out = Surface::from_basis(rz, grid).with_settings(settings);
    let residual = out.least_squares_fit(target.view())?;
    log::debug!(
        "XYZFourier -> RZFourier (mpol {}, ntor {}): residual {:e}",
        out.mpol(),
        out.ntor(),
        residual
    );
    Ok(out)
}

/// See [`SurfaceRZFourier::to_garabedian`].
pub fn rz_to_garabedian(surface: &SurfaceRZFourier) -> Result<SurfaceGarabedian> {
    surface.to_garabedian()
}

/// See [`SurfaceGarabedian::to_rz_fourier`].
pub fn garabedian_to_rz(surface: &SurfaceGarabedian) -> SurfaceRZFourier {
    surface.to_rz_fourier()
}
