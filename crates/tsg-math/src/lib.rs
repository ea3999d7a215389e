pub mod cylindrical;
pub mod grid;
pub mod lstsq;
pub mod rotation;
pub mod taylor;

pub use glam::{DMat3, DVec3};
pub use cylindrical::{unwrap_near, wrap_to_pi, Cylindrical};
pub use grid::QuadratureGrid;
pub use rotation::ToroidalRotation;

pub type Point3 = DVec3;
pub type Vector3 = DVec3;
