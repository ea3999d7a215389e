use crate::{DMat3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Rotation about the z-axis, optionally preceded by the stellarator flip
/// `(x, y, z) -> (x, -y, -z)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToroidalRotation {
    pub matrix: [f64; 9],
}

impl ToroidalRotation {
    pub fn identity() -> Self {
        Self::from_mat3(DMat3::IDENTITY)
    }

    /// Rotate by `angle` radians about z; `flip` applies the stellarator flip first.
    pub fn new(angle: f64, flip: bool) -> Self {
        let rot = DMat3::from_rotation_z(angle);
        if flip {
            Self::from_mat3(rot * DMat3::from_diagonal(Vector3::new(1.0, -1.0, -1.0)))
        } else {
            Self::from_mat3(rot)
        }
    }

    pub fn from_mat3(m: DMat3) -> Self {
        Self {
            matrix: m.to_cols_array(),
        }
    }

    pub fn to_mat3(&self) -> DMat3 {
        DMat3::from_cols_array(&self.matrix)
    }

    pub fn transform_point(&self, p: Point3) -> Point3 {
        self.to_mat3() * p
    }

    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        self.to_mat3() * v
    }

    /// Orthogonal, so the inverse is the transpose.
    pub fn inverse(&self) -> ToroidalRotation {
        Self::from_mat3(self.to_mat3().transpose())
    }
}

impl Default for ToroidalRotation {
    fn default() -> Self {
        Self::identity()
    }
}
