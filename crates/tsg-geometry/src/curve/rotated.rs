//! A curve obtained by rotating another curve about the z-axis.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array2, Array3};
use tsg_core::{DependencyRegistry, Dependent};
use tsg_math::{ToroidalRotation, Vector3};

use super::{Curve, CurveCache};

/// The source curve rotated by a fixed angle, optionally after the stellarator flip.
///
/// Owns no dofs: its Jacobians are taken with respect to the source's dofs. It is
/// registered as a dependent of the source, so changing the source's dofs clears
/// its cache.
pub struct RotatedCurve<C> {
    source: Rc<RefCell<C>>,
    rotation: ToroidalRotation,
    quadpoints: Vec<f64>,
    cache: CurveCache,
    dependents: RefCell<DependencyRegistry>,
}

impl<C: Curve + 'static> RotatedCurve<C> {
    pub fn new(source: Rc<RefCell<C>>, angle: f64, flip: bool) -> Rc<Self> {
        let quadpoints = source.borrow().quadpoints().to_vec();
        let curve = Rc::new(Self {
            source: Rc::clone(&source),
            rotation: ToroidalRotation::new(angle, flip),
            quadpoints,
            cache: CurveCache::default(),
            dependents: RefCell::new(DependencyRegistry::new()),
        });
        let as_dependent: Rc<dyn Dependent> = curve.clone();
        source.borrow().register_dependent(&as_dependent);
        curve
    }

    pub fn rotation(&self) -> &ToroidalRotation {
        &self.rotation
    }

    pub fn source(&self) -> &Rc<RefCell<C>> {
        &self.source
    }

    fn rotate_rows(&self, a: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::zeros(a.dim());
        for i in 0..a.nrows() {
            let v = self
                .rotation
                .transform_vector(Vector3::new(a[[i, 0]], a[[i, 1]], a[[i, 2]]));
            out[[i, 0]] = v.x;
            out[[i, 1]] = v.y;
            out[[i, 2]] = v.z;
        }
        out
    }
}

impl<C: Curve + 'static> Curve for RotatedCurve<C> {
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
        let source = self.source.borrow();
        let raw = match order {
            0 => source.gamma(),
            1 => source.gammadash(),
            2 => source.gammadashdash(),
            3 => source.gammadashdashdash(),
            _ => Rc::new(source.compute_gamma(order)),
        };
        self.rotate_rows(&raw)
    }

    fn compute_dgamma_by_dcoeff(&self, order: usize) -> Array3<f64> {
        let source = self.source.borrow();
        let raw = match order {
            0 => source.dgamma_by_dcoeff(),
            1 => source.dgammadash_by_dcoeff(),
            2 => source.dgammadashdash_by_dcoeff(),
            3 => source.dgammadashdashdash_by_dcoeff(),
            _ => Rc::new(source.compute_dgamma_by_dcoeff(order)),
        };
        let (n, _, ndofs) = raw.dim();
        let mut out = Array3::zeros((n, 3, ndofs));
        for i in 0..n {
            for k in 0..ndofs {
                let v = self.rotation.transform_vector(Vector3::new(
                    raw[[i, 0, k]],
                    raw[[i, 1, k]],
                    raw[[i, 2, k]],
                ));
                out[[i, 0, k]] = v.x;
                out[[i, 1, k]] = v.y;
                out[[i, 2, k]] = v.z;
            }
        }
        out
    }
}

impl<C> Dependent for RotatedCurve<C> {
    fn invalidate_cache(&self, depth: usize) {
        self.cache.invalidate_all();
        DependencyRegistry::notify(&self.dependents, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveXYZFourier;
    use std::f64::consts::FRAC_PI_2;
    use tsg_core::Optimizable;

    fn source() -> Rc<RefCell<CurveXYZFourier>> {
        let mut c = CurveXYZFourier::uniform(16, 1).unwrap();
        c.set_dofs(&[1.0, 0.3, 0.0, 0.0, 0.0, 0.2, 0.5, 0.0, 0.1]).unwrap();
        Rc::new(RefCell::new(c))
    }

    #[test]
    fn test_quarter_turn() {
        let src = source();
        let rotated = RotatedCurve::new(Rc::clone(&src), FRAC_PI_2, false);
        let g = src.borrow().gamma();
        let r = rotated.gamma();
        for i in 0..g.nrows() {
            assert!((r[[i, 0]] + g[[i, 1]]).abs() < 1e-14);
            assert!((r[[i, 1]] - g[[i, 0]]).abs() < 1e-14);
            assert!((r[[i, 2]] - g[[i, 2]]).abs() < 1e-14);
        }
    }

    #[test]
    fn test_flip_preserves_curvature() {
        let src = source();
        let rotated = RotatedCurve::new(Rc::clone(&src), 0.7, true);
        let k0 = src.borrow().kappa().unwrap();
        let k1 = rotated.kappa().unwrap();
        for (a, b) in k0.iter().zip(k1.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_source_change_invalidates_rotated() {
        let src = source();
        let rotated = RotatedCurve::new(Rc::clone(&src), 0.3, false);
        let before = rotated.gamma()[[0, 2]];
        assert!(rotated.cache().gamma.is_fresh());

        let mut dofs = src.borrow().get_dofs();
        dofs[6] += 1.0;
        src.borrow_mut().set_dofs(&dofs).unwrap();

        assert!(!rotated.cache().gamma.is_fresh());
        assert!((rotated.gamma()[[0, 2]] - before - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_dropping_rotated_curve_prunes_registration() {
        let src = source();
        let rotated = RotatedCurve::new(Rc::clone(&src), 0.3, false);
        assert_eq!(src.borrow().dependents().borrow().len(), 1);
        drop(rotated);
        assert!(src.borrow().dependents().borrow().is_empty());
    }
}
