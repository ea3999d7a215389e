use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array2, Array3, Array4};
use tsg_core::Optimizable;
use tsg_geometry::{
    Curve, CurveXYZFourier, Garabedian, RotatedCurve, RzFourier, Surface, SurfaceBasis,
    XyzFourier,
};
use tsg_math::taylor::{dyadic_steps, fd_jacobian, random_direction, taylor_test, TaylorOrder};
use tsg_math::QuadratureGrid;

fn flatten3(a: &Array3<f64>) -> Vec<f64> {
    a.iter().copied().collect()
}

fn flatten4(a: &Array4<f64>) -> Array2<f64> {
    let (n0, n1, n2, n3) = a.dim();
    Array2::from_shape_vec((n0 * n1 * n2, n3), a.iter().copied().collect()).unwrap()
}

/// Scalar as a one-element vector and its gradient as a one-row Jacobian.
fn row(v: &ndarray::Array1<f64>) -> Array2<f64> {
    v.view().insert_axis(ndarray::Axis(0)).to_owned()
}

fn perturbed<B: SurfaceBasis>(basis: B, seed: u64) -> Surface<B> {
    let grid = QuadratureGrid::field_period(7, 8, basis.nfp()).unwrap();
    let mut s = Surface::from_basis(basis, grid);
    let noise = random_direction(s.num_dofs(), seed);
    let dofs: Vec<f64> = s
        .get_dofs()
        .iter()
        .zip(&noise)
        .map(|(d, e)| d + 0.02 * e)
        .collect();
    s.set_dofs(&dofs).unwrap();
    s
}

fn rz_surfaces() -> Vec<Surface<RzFourier>> {
    [true, false]
        .into_iter()
        .map(|stellsym| perturbed(RzFourier::new(3, stellsym, 2, 1).unwrap(), 1))
        .collect()
}

fn xyz_surfaces() -> Vec<Surface<XyzFourier>> {
    [true, false]
        .into_iter()
        .map(|stellsym| perturbed(XyzFourier::new(3, stellsym, 2, 1).unwrap(), 2))
        .collect()
}

fn garabedian_surface() -> Surface<Garabedian> {
    perturbed(Garabedian::new(2, -1, 3, -1, 1).unwrap(), 3)
}

type Field<B> = fn(&Surface<B>) -> Rc<Array3<f64>>;
type Jacobian<B> = fn(&Surface<B>) -> Rc<Array4<f64>>;

/// Runs Taylor tests of every surface Jacobian at the current dofs.
fn check_surface<B: SurfaceBasis>(surface: Surface<B>) {
    let x = surface.get_dofs();
    let direction = random_direction(x.len(), 42);
    let s = RefCell::new(surface);
    let set = |x: &[f64]| s.borrow_mut().set_dofs(x).unwrap();

    let fields: [(&str, Field<B>, Jacobian<B>); 4] = [
        ("gamma", Surface::gamma, Surface::dgamma_by_dcoeff),
        ("gammadash1", Surface::gammadash1, Surface::dgammadash1_by_dcoeff),
        ("gammadash2", Surface::gammadash2, Surface::dgammadash2_by_dcoeff),
        ("normal", Surface::normal, Surface::dnormal_by_dcoeff),
    ];
    for (name, field, jacobian) in fields {
        let report = taylor_test(
            |x| {
                set(x);
                flatten3(&field(&s.borrow()))
            },
            |x| {
                set(x);
                flatten4(&jacobian(&s.borrow()))
            },
            &x,
            &direction,
            &dyadic_steps(11, 20),
            TaylorOrder::Fourth,
        );
        assert!(report.passed(), "{name}: {:?}", report);
    }

    let report = taylor_test(
        |x| {
            set(x);
            vec![s.borrow().area()]
        },
        |x| {
            set(x);
            row(&s.borrow().darea_by_dcoeff().unwrap())
        },
        &x,
        &direction,
        &dyadic_steps(11, 20),
        TaylorOrder::Fourth,
    );
    assert!(report.passed(), "area: {:?}", report);

    let report = taylor_test(
        |x| {
            set(x);
            vec![s.borrow().volume()]
        },
        |x| {
            set(x);
            row(&s.borrow().dvolume_by_dcoeff())
        },
        &x,
        &direction,
        &dyadic_steps(8, 20),
        TaylorOrder::Second,
    );
    assert!(report.passed(), "volume: {:?}", report);
}

#[test]
fn test_rz_derivatives() {
    for s in rz_surfaces() {
        check_surface(s);
    }
}

#[test]
fn test_xyz_derivatives() {
    for s in xyz_surfaces() {
        check_surface(s);
    }
}

#[test]
fn test_garabedian_derivatives() {
    check_surface(garabedian_surface());
}

#[test]
fn test_dnormal_matches_finite_differences() {
    let s = RefCell::new(xyz_surfaces().remove(1));
    let x = s.borrow().get_dofs();
    let fd = fd_jacobian(
        |x| {
            s.borrow_mut().set_dofs(x).unwrap();
            flatten3(&s.borrow().normal())
        },
        &x,
        1e-6,
    );
    s.borrow_mut().set_dofs(&x).unwrap();
    let exact = flatten4(&s.borrow().dnormal_by_dcoeff());
    let err = (&fd - &exact).mapv(f64::abs).fold(0.0_f64, |a, &b| a.max(b));
    assert!(err < 1e-7, "max error {err}");
}

fn wobbly_curve() -> CurveXYZFourier {
    let mut c = CurveXYZFourier::uniform(30, 3).unwrap();
    let base = [
        1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.3, 0.0, 0.0, 0.0,
    ];
    let noise = random_direction(base.len(), 9);
    let dofs: Vec<f64> = base.iter().zip(&noise).map(|(b, e)| b + 0.05 * e).collect();
    c.set_dofs(&dofs).unwrap();
    c
}

type CurveField = fn(&CurveXYZFourier) -> Vec<f64>;
type CurveJacobian = fn(&CurveXYZFourier) -> Array2<f64>;

fn flatten_jacobian(a: &Array3<f64>) -> Array2<f64> {
    let (n, d, k) = a.dim();
    Array2::from_shape_vec((n * d, k), a.iter().copied().collect()).unwrap()
}

#[test]
fn test_curve_derivatives() {
    let curve = wobbly_curve();
    let x = curve.get_dofs();
    let direction = random_direction(x.len(), 17);
    let c = RefCell::new(curve);
    let set = |x: &[f64]| c.borrow_mut().set_dofs(x).unwrap();

    let checks: [(&str, CurveField, CurveJacobian, TaylorOrder); 7] = [
        (
            "gamma",
            |c| c.gamma().iter().copied().collect(),
            |c| flatten_jacobian(&c.dgamma_by_dcoeff()),
            TaylorOrder::Fourth,
        ),
        (
            "gammadash",
            |c| c.gammadash().iter().copied().collect(),
            |c| flatten_jacobian(&c.dgammadash_by_dcoeff()),
            TaylorOrder::Fourth,
        ),
        (
            "gammadashdash",
            |c| c.gammadashdash().iter().copied().collect(),
            |c| flatten_jacobian(&c.dgammadashdash_by_dcoeff()),
            TaylorOrder::Fourth,
        ),
        (
            "gammadashdashdash",
            |c| c.gammadashdashdash().iter().copied().collect(),
            |c| flatten_jacobian(&c.dgammadashdashdash_by_dcoeff()),
            TaylorOrder::Fourth,
        ),
        (
            "incremental_arclength",
            |c| c.incremental_arclength().to_vec(),
            |c| c.dincremental_arclength_by_dcoeff().unwrap().as_ref().clone(),
            TaylorOrder::Second,
        ),
        (
            "kappa",
            |c| c.kappa().unwrap().to_vec(),
            |c| c.dkappa_by_dcoeff().unwrap().as_ref().clone(),
            TaylorOrder::Second,
        ),
        (
            "length",
            |c| vec![c.length()],
            |c| row(&c.dlength_by_dcoeff().unwrap()),
            TaylorOrder::Second,
        ),
    ];
    for (name, field, jacobian, order) in checks {
        let steps = match order {
            TaylorOrder::Fourth => dyadic_steps(11, 20),
            TaylorOrder::Second => dyadic_steps(8, 20),
        };
        let report = taylor_test(
            |x| {
                set(x);
                field(&c.borrow())
            },
            |x| {
                set(x);
                jacobian(&c.borrow())
            },
            &x,
            &direction,
            &steps,
            order,
        );
        assert!(report.passed(), "{name}: {:?}", report);
    }
}

#[test]
fn test_rotated_curve_derivatives() {
    let source = Rc::new(RefCell::new(wobbly_curve()));
    let rotated = RotatedCurve::new(Rc::clone(&source), 0.9, true);
    let x = source.borrow().get_dofs();
    let direction = random_direction(x.len(), 23);
    let set = |x: &[f64]| source.borrow_mut().set_dofs(x).unwrap();

    let report = taylor_test(
        |x| {
            set(x);
            rotated.gammadash().iter().copied().collect()
        },
        |x| {
            set(x);
            flatten_jacobian(&rotated.dgammadash_by_dcoeff())
        },
        &x,
        &direction,
        &dyadic_steps(11, 20),
        TaylorOrder::Fourth,
    );
    assert!(report.passed(), "rotated gammadash: {:?}", report);

    let report = taylor_test(
        |x| {
            set(x);
            rotated.kappa().unwrap().to_vec()
        },
        |x| {
            set(x);
            rotated.dkappa_by_dcoeff().unwrap().as_ref().clone()
        },
        &x,
        &direction,
        &dyadic_steps(8, 20),
        TaylorOrder::Second,
    );
    assert!(report.passed(), "rotated kappa: {:?}", report);
}
