//! Quadrature grids in normalized angle coordinates.

use serde::{Deserialize, Serialize};
use tsg_core::{Result, TsgError};

/// `n` uniformly spaced points in `[0, extent)`, endpoint excluded.
pub fn linspace_periodic(n: usize, extent: f64) -> Vec<f64> {
    (0..n).map(|i| extent * i as f64 / n as f64).collect()
}

/// Sample parameters at which all surface fields are materialized.
///
/// Both angles are normalized so that one full toroidal or poloidal turn is `1.0`.
/// The order of the points defines the indexing of every field array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadratureGrid {
    phi_points: Vec<f64>,
    theta_points: Vec<f64>,
}

impl QuadratureGrid {
    /// Full turn in both angles.
    pub fn uniform(nphi: usize, ntheta: usize) -> Result<Self> {
        Self::from_points(linspace_periodic(nphi, 1.0), linspace_periodic(ntheta, 1.0))
    }

    /// One field period toroidally, a full turn poloidally.
    pub fn field_period(nphi: usize, ntheta: usize, nfp: u32) -> Result<Self> {
        if nfp == 0 {
            return Err(TsgError::InvalidParameter("nfp must be positive".into()));
        }
        Self::from_points(
            linspace_periodic(nphi, 1.0 / nfp as f64),
            linspace_periodic(ntheta, 1.0),
        )
    }

    pub fn from_points(phi_points: Vec<f64>, theta_points: Vec<f64>) -> Result<Self> {
        validate_points("phi", &phi_points)?;
        validate_points("theta", &theta_points)?;
        Ok(Self {
            phi_points,
            theta_points,
        })
    }

    pub fn phi_points(&self) -> &[f64] {
        &self.phi_points
    }

    pub fn theta_points(&self) -> &[f64] {
        &self.theta_points
    }

    pub fn nphi(&self) -> usize {
        self.phi_points.len()
    }

    pub fn ntheta(&self) -> usize {
        self.theta_points.len()
    }

    pub fn len(&self) -> usize {
        self.nphi() * self.ntheta()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(i, j, phi, theta)` in row-major (φ-major) order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64, f64)> + '_ {
        self.phi_points.iter().enumerate().flat_map(move |(i, &phi)| {
            self.theta_points
                .iter()
                .enumerate()
                .map(move |(j, &theta)| (i, j, phi, theta))
        })
    }
}

/// Validate a one-dimensional list of normalized sample parameters.
pub fn validate_points(name: &str, points: &[f64]) -> Result<()> {
    if points.is_empty() {
        return Err(TsgError::InvalidParameter(format!(
            "{name} quadrature points must not be empty"
        )));
    }
    if let Some(bad) = points.iter().find(|p| !(0.0..1.0).contains(*p)) {
        return Err(TsgError::InvalidParameter(format!(
            "{name} quadrature point {bad} outside [0, 1)"
        )));
    }
    Ok(())
}
