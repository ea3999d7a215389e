//! Planar cross-sections at a fixed physical toroidal angle.
//!
//! A surface's own `φ` need not be the cylindrical angle, so for every θ the
//! parameter whose point lies in the half-plane at the requested angle is found
//! by bracketing on a uniform φ sample followed by bisection. The angle must
//! advance monotonically in φ, otherwise the crossing is not unique.

use std::f64::consts::TAU;

use ndarray::Array2;
use rayon::prelude::*;
use tsg_core::{Result, Settings, TsgError};
use tsg_math::cylindrical::axis_distance_sq;
use tsg_math::{unwrap_near, Cylindrical, Point3};

use super::SurfaceBasis;

/// Fewest φ samples used to bracket the crossing.
pub const MIN_VARPHI_RESOLUTION: usize = 32;

fn cylindrical_angle<B: SurfaceBasis>(
    basis: &B,
    settings: &Settings,
    varphi: f64,
    theta: f64,
) -> Result<f64> {
    let p = basis.gamma_at(varphi, theta);
    if !p.is_finite() {
        return Err(TsgError::DegenerateGeometry(format!(
            "non-finite surface point at (phi, theta) = ({varphi}, {theta})"
        )));
    }
    if axis_distance_sq(p) <= settings.axis_eps {
        return Err(TsgError::DegenerateGeometry(format!(
            "surface meets the z-axis at (phi, theta) = ({varphi}, {theta})"
        )));
    }
    Ok(Cylindrical::from_point(p).phi)
}

/// Point of the `theta` curve whose cylindrical angle is `phi0` (mod 2π).
fn solve_row<B: SurfaceBasis>(
    basis: &B,
    settings: &Settings,
    phi0: f64,
    theta: f64,
    nres: usize,
) -> Result<Point3> {
    let step = 1.0 / nres as f64;
    let mut psi = Vec::with_capacity(nres + 1);
    psi.push(cylindrical_angle(basis, settings, 0.0, theta)?);
    for k in 1..=nres {
        let angle = cylindrical_angle(basis, settings, k as f64 * step, theta)?;
        psi.push(unwrap_near(angle, psi[k - 1]));
    }

    let winding = ((psi[nres] - psi[0]) / TAU).round();
    if winding.abs() != 1.0 {
        return Err(TsgError::DegenerateGeometry(format!(
            "curve at theta = {theta} winds {winding} times around the z-axis"
        )));
    }

    // A reversal would leave several parameters at the same physical angle.
    if let Some(k) = (0..nres).find(|&k| (psi[k + 1] - psi[k]) * winding < 0.0) {
        return Err(TsgError::DegenerateGeometry(format!(
            "cylindrical angle reverses between phi = {} and {} at theta = {theta}",
            k as f64 * step,
            (k + 1) as f64 * step
        )));
    }

    // Shift the target into the branch swept by the samples.
    let psi0 = psi[0];
    let target = if winding > 0.0 {
        psi0 + (phi0 - psi0).rem_euclid(TAU)
    } else {
        psi0 - (psi0 - phi0).rem_euclid(TAU)
    };

    let k = (0..nres)
        .find(|&k| (psi[k] - target) * (psi[k + 1] - target) <= 0.0)
        .ok_or_else(|| {
            TsgError::DegenerateGeometry(format!(
                "no bracket for angle {phi0} at theta = {theta}"
            ))
        })?;
    if psi[k] == target {
        return Ok(basis.gamma_at(k as f64 * step, theta));
    }

    let reference = psi[k];
    let (mut a, mut b) = (k as f64 * step, (k + 1) as f64 * step);
    let mut fa = psi[k] - target;
    for _ in 0..settings.max_bisection_iters {
        let c = 0.5 * (a + b);
        if settings.interval_converged(a, b) || c <= a || c >= b {
            return Ok(basis.gamma_at(c, theta));
        }
        let fc = unwrap_near(cylindrical_angle(basis, settings, c, theta)?, reference) - target;
        if fc == 0.0 {
            return Ok(basis.gamma_at(c, theta));
        }
        if (fa < 0.0) == (fc < 0.0) {
            a = c;
            fa = fc;
        } else {
            b = c;
        }
    }
    Err(TsgError::Convergence {
        iterations: settings.max_bisection_iters,
        message: format!(
            "bisection for angle {phi0} at theta = {theta} stopped at width {:e}",
            b - a
        ),
    })
}

/// Cross-section at physical angle `phi0` (radians) through the given θ values.
///
/// Returns one point per θ, shape `(thetas.len(), 3)`. Rows are solved in parallel.
pub fn cross_section_at_thetas<B: SurfaceBasis>(
    basis: &B,
    settings: &Settings,
    phi0: f64,
    thetas: &[f64],
    varphi_resolution: usize,
) -> Result<Array2<f64>> {
    if thetas.is_empty() {
        return Err(TsgError::InvalidParameter(
            "cross-section needs at least one theta".into(),
        ));
    }
    if varphi_resolution < 2 {
        return Err(TsgError::InvalidParameter(format!(
            "varphi resolution {varphi_resolution} is too small to bracket a crossing"
        )));
    }
    if !phi0.is_finite() {
        return Err(TsgError::InvalidParameter(format!(
            "cross-section angle {phi0} is not finite"
        )));
    }
    log::trace!(
        "cross-section at {phi0} through {} thetas, {varphi_resolution} phi samples",
        thetas.len()
    );

    let points = thetas
        .par_iter()
        .map(|&theta| solve_row(basis, settings, phi0, theta, varphi_resolution))
        .collect::<Result<Vec<Point3>>>()?;

    let mut out = Array2::zeros((points.len(), 3));
    for (row, p) in points.iter().enumerate() {
        out[[row, 0]] = p.x;
        out[[row, 1]] = p.y;
        out[[row, 2]] = p.z;
    }
    Ok(out)
}
