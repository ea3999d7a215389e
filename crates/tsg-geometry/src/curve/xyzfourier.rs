//! Closed curve with each Cartesian component a Fourier series in `t`.

use std::cell::RefCell;
use std::f64::consts::TAU;

use ndarray::{Array2, Array3};
use tsg_core::{DependencyRegistry, Dependent, Invalidate, Optimizable, Result, TsgError};
use tsg_math::grid::{linspace_periodic, validate_points};

use super::{Curve, CurveCache};
use crate::basis::{trig_derivative, Parity};

/// `x(t) = x₀ + Σ_{j=1..order} xs_j sin(2πjt) + xc_j cos(2πjt)`, likewise for `y`, `z`.
///
/// Each component stores `[x₀, xs₁, xc₁, xs₂, xc₂, …]`; the dofs are the three
/// components concatenated.
#[derive(Debug, Clone)]
pub struct CurveXYZFourier {
    order: usize,
    quadpoints: Vec<f64>,
    coefficients: [Vec<f64>; 3],
    cache: CurveCache,
    dependents: RefCell<DependencyRegistry>,
}

impl CurveXYZFourier {
    /// All coefficients zero.
    pub fn new(quadpoints: Vec<f64>, order: usize) -> Result<Self> {
        validate_points("curve", &quadpoints)?;
        let len = 2 * order + 1;
        Ok(Self {
            order,
            quadpoints,
            coefficients: [vec![0.0; len], vec![0.0; len], vec![0.0; len]],
            cache: CurveCache::default(),
            dependents: RefCell::new(DependencyRegistry::new()),
        })
    }

    /// `nquad` uniformly spaced quadrature points.
    pub fn uniform(nquad: usize, order: usize) -> Result<Self> {
        Self::new(linspace_periodic(nquad, 1.0), order)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Coefficients of component `axis` (0 = x, 1 = y, 2 = z).
    pub fn coefficients(&self, axis: usize) -> Result<&[f64]> {
        self.coefficients
            .get(axis)
            .map(Vec::as_slice)
            .ok_or_else(|| TsgError::InvalidParameter(format!("curve axis {axis} out of range")))
    }

    pub fn set_coefficient(&mut self, axis: usize, index: usize, value: f64) -> Result<()> {
        let slot = self
            .coefficients
            .get_mut(axis)
            .and_then(|c| c.get_mut(index))
            .ok_or_else(|| {
                TsgError::InvalidParameter(format!(
                    "curve coefficient ({axis}, {index}) out of range for order {}",
                    self.order
                ))
            })?;
        *slot = value;
        self.invalidate_cache();
        Ok(())
    }

    /// `k`-th derivative of basis function `l` at `t`.
    fn basis(l: usize, k: usize, t: f64) -> f64 {
        if l == 0 {
            return if k == 0 { 1.0 } else { 0.0 };
        }
        let j = (l + 1) / 2;
        let w = TAU * j as f64;
        let (s, c) = (w * t).sin_cos();
        let parity = if l % 2 == 1 { Parity::Sin } else { Parity::Cos };
        w.powi(k as i32) * trig_derivative(parity, k, s, c)
    }

    pub fn invalidate_cache(&self) {
        Dependent::invalidate_cache(self, 0);
    }
}

impl Curve for CurveXYZFourier {
    fn quadpoints(&self) -> &[f64] {
        &self.quadpoints
    }

    fn cache(&self) -> &CurveCache {
        &self.cache
    }

    fn dependents(&self) -> &RefCell<DependencyRegistry> {
        &self.dependents
    }

    fn compute_gamma(&self, order: usize) -> Array2<f64> {
        let mut out = Array2::zeros((self.quadpoints.len(), 3));
        for (i, &t) in self.quadpoints.iter().enumerate() {
            for (axis, coeffs) in self.coefficients.iter().enumerate() {
                out[[i, axis]] = coeffs
                    .iter()
                    .enumerate()
                    .map(|(l, c)| c * Self::basis(l, order, t))
                    .sum();
            }
        }
        out
    }

    fn compute_dgamma_by_dcoeff(&self, order: usize) -> Array3<f64> {
        let len = 2 * self.order + 1;
        let mut out = Array3::zeros((self.quadpoints.len(), 3, 3 * len));
        for (i, &t) in self.quadpoints.iter().enumerate() {
            for l in 0..len {
                let b = Self::basis(l, order, t);
                for axis in 0..3 {
                    out[[i, axis, axis * len + l]] = b;
                }
            }
        }
        out
    }
}

impl Optimizable for CurveXYZFourier {
    fn num_dofs(&self) -> usize {
        3 * (2 * self.order + 1)
    }

    fn get_dofs(&self) -> Vec<f64> {
        self.coefficients.concat()
    }

    fn set_dofs(&mut self, dofs: &[f64]) -> Result<()> {
        TsgError::check_len(self.num_dofs(), dofs.len())?;
        let len = 2 * self.order + 1;
        for (coeffs, chunk) in self.coefficients.iter_mut().zip(dofs.chunks(len)) {
            coeffs.copy_from_slice(chunk);
        }
        self.invalidate_cache();
        Ok(())
    }

    fn dof_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.num_dofs());
        for axis in ['x', 'y', 'z'] {
            names.push(format!("{axis}c(0)"));
            for j in 1..=self.order {
                names.push(format!("{axis}s({j})"));
                names.push(format!("{axis}c({j})"));
            }
        }
        names
    }
}

impl Dependent for CurveXYZFourier {
    fn invalidate_cache(&self, depth: usize) {
        self.cache.invalidate_all();
        DependencyRegistry::notify(&self.dependents, depth);
    }
}

impl Invalidate for CurveXYZFourier {
    fn invalidate_cache(&self) {
        CurveXYZFourier::invalidate_cache(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Circle of radius `r` in the xy-plane.
    fn circle(r: f64) -> CurveXYZFourier {
        let mut c = CurveXYZFourier::uniform(40, 2).unwrap();
        c.set_coefficient(0, 2, r).unwrap();
        c.set_coefficient(1, 1, r).unwrap();
        c
    }

    #[test]
    fn test_circle_length_and_curvature() {
        let c = circle(2.0);
        assert_relative_eq!(c.length(), TAU * 2.0, epsilon = 1e-12);
        for k in c.kappa().unwrap().iter() {
            assert_relative_eq!(*k, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_frenet_frame_of_circle() {
        let c = circle(1.0);
        let frame = c.frenet_frame().unwrap();
        let gamma = c.gamma();
        for i in 0..gamma.nrows() {
            // principal normal points to the centre
            for axis in 0..3 {
                assert!((frame.normal[[i, axis]] + gamma[[i, axis]]).abs() < 1e-12);
            }
            assert!((frame.binormal[[i, 2]] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_dofs_roundtrip_and_names() {
        let mut c = CurveXYZFourier::uniform(10, 1).unwrap();
        let dofs: Vec<f64> = (0..c.num_dofs()).map(|i| i as f64).collect();
        c.set_dofs(&dofs).unwrap();
        assert_eq!(c.get_dofs(), dofs);
        assert_eq!(c.dof_names()[..3], ["xc(0)", "xs(1)", "xc(1)"]);
        assert!(c.set_dofs(&dofs[1..]).is_err());
    }

    #[test]
    fn test_set_dofs_invalidates() {
        let mut c = circle(1.0);
        let before = c.gamma();
        assert!(c.cache().gamma.is_fresh());
        let mut dofs = c.get_dofs();
        dofs[0] = 0.5;
        c.set_dofs(&dofs).unwrap();
        assert!(!c.cache().gamma.is_fresh());
        assert!((c.gamma()[[0, 0]] - before[[0, 0]] - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_straight_line_has_no_frenet_frame() {
        let mut c = CurveXYZFourier::uniform(8, 1).unwrap();
        c.set_coefficient(0, 1, 1.0).unwrap();
        assert!(c.frenet_frame().is_err());
        assert!(c.dkappa_by_dcoeff().is_err());
    }
}
