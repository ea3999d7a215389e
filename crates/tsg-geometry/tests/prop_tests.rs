//! Property-based tests for coefficient layouts and representation changes.

use proptest::prelude::*;
use tsg_core::Optimizable;
use tsg_geometry::{SurfaceRZFourier, SurfaceXYZFourier, XyzFourier};
use tsg_math::QuadratureGrid;

fn grid() -> QuadratureGrid {
    QuadratureGrid::uniform(3, 3).unwrap()
}

proptest! {
    /// set_dofs followed by get_dofs returns the input bit for bit.
    #[test]
    fn rz_dofs_roundtrip(
        nfp in 1u32..6,
        stellsym in any::<bool>(),
        mpol in 0usize..5,
        ntor in 0usize..4,
        seed in proptest::collection::vec(-2.0f64..2.0, 100),
    ) {
        let mut s = SurfaceRZFourier::new(nfp, stellsym, mpol, ntor, grid()).unwrap();
        let n = s.num_dofs();
        let dofs: Vec<f64> = seed.iter().cycle().take(n).copied().collect();
        s.set_dofs(&dofs).unwrap();
        prop_assert_eq!(s.get_dofs(), dofs);
        prop_assert_eq!(s.dof_names().len(), n);
    }

    /// Six coefficient families without stellarator symmetry, three (xc, ys, zs) with it.
    #[test]
    fn xyz_dof_count(
        stellsym in any::<bool>(),
        mpol in 1usize..5,
        ntor in 0usize..4,
    ) {
        let mut s = SurfaceXYZFourier::new(2, stellsym, mpol, ntor, grid()).unwrap();
        let per_family = (mpol + 1) * (2 * ntor + 1) - ntor;
        // sine families drop the (0, 0) mode
        let expected = if stellsym {
            3 * per_family - 2
        } else {
            6 * per_family - 3
        };
        prop_assert_eq!(s.num_dofs(), expected);
        prop_assert!(s.set_dofs(&vec![0.0; expected + 1]).is_err());
    }

    /// RZ -> Garabedian -> RZ is the identity on stellarator-symmetric coefficients.
    #[test]
    fn garabedian_roundtrip(
        mpol in 1usize..5,
        ntor in 0usize..4,
        seed in proptest::collection::vec(-1.0f64..1.0, 80),
    ) {
        let mut s = SurfaceRZFourier::new(1, true, mpol, ntor, grid()).unwrap();
        let dofs: Vec<f64> = seed.iter().cycle().take(s.num_dofs()).copied().collect();
        s.set_dofs(&dofs).unwrap();
        let back = s.to_garabedian().unwrap().to_rz_fourier();
        prop_assert_eq!(back.num_dofs(), dofs.len());
        for (a, b) in back.get_dofs().iter().zip(&dofs) {
            prop_assert!((a - b).abs() < 1e-12);
        }
    }

    /// Torus constructors place the surface at the requested radii.
    #[test]
    fn xyz_torus_outboard_point(
        major in 1.0f64..5.0,
        minor in 0.05f64..0.9,
    ) {
        let xyz = XyzFourier::torus(1, true, 1, 0, major, minor).unwrap();
        let s = tsg_geometry::Surface::from_basis(xyz, grid());
        let p = s.gamma_at(&[(0.0, 0.0)]);
        prop_assert!((p[[0, 0]] - (major + minor)).abs() < 1e-12);
        prop_assert!(p[[0, 1]].abs() < 1e-12);
        prop_assert!(p[[0, 2]].abs() < 1e-12);
    }
}
