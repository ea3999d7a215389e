use std::f64::consts::{PI, TAU};

use crate::Point3;

/// Cylindrical coordinates `(R, phi, Z)` of a point about the z-axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylindrical {
    pub r: f64,
    pub phi: f64,
    pub z: f64,
}

impl Cylindrical {
    pub fn from_point(p: Point3) -> Self {
        Self {
            r: p.x.hypot(p.y),
            phi: p.y.atan2(p.x),
            z: p.z,
        }
    }
}

/// Squared distance of a point from the z-axis.
pub fn axis_distance_sq(p: Point3) -> f64 {
    p.x * p.x + p.y * p.y
}

/// Map an angle into `(-PI, PI]`.
pub fn wrap_to_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// The representative of `angle` (mod 2π) closest to `reference`.
pub fn unwrap_near(angle: f64, reference: f64) -> f64 {
    reference + wrap_to_pi(angle - reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    #[test]
    fn test_cylindrical_roundtrip() {
        let p = dvec3(-1.0, 2.0, 0.5);
        let c = Cylindrical::from_point(p);
        assert!((c.r - 5f64.sqrt()).abs() < 1e-12);
        assert!((c.phi - 2f64.atan2(-1.0)).abs() < 1e-12);
        assert_eq!(c.z, 0.5);
        let back = dvec3(c.r * c.phi.cos(), c.r * c.phi.sin(), c.z);
        assert!((back - p).length() < 1e-12);
    }

    #[test]
    fn test_wrap_to_pi() {
        assert!((wrap_to_pi(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_to_pi(-PI / 2.0 - TAU) + PI / 2.0).abs() < 1e-12);
        assert!(wrap_to_pi(1000.0).abs() <= PI);
    }

    #[test]
    fn test_unwrap_near() {
        let a = unwrap_near(-3.0, 3.0);
        assert!((a - (TAU - 3.0)).abs() < 1e-12);
        assert!((unwrap_near(0.1, 20.0 * PI) - (20.0 * PI + 0.1)).abs() < 1e-9);
    }
}
