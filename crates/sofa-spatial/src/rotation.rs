//! Orientation from view/up pairs and the local ↔ global frame transform.

use nalgebra::{Matrix3, Vector3};

/// Direction-cosine matrix with columns `[view, up × view, up]`.
///
/// `view` and `up` are scaled to unit length but are not
/// orthogonalized: a pair that is not perpendicular yields a matrix that is
/// not a rotation. Zero-length inputs are used as given.
pub fn rotation_from_view_up(view: &Vector3<f64>, up: &Vector3<f64>) -> Matrix3<f64> {
    let view = view.try_normalize(f64::EPSILON).unwrap_or(*view);
    let up = up.try_normalize(f64::EPSILON).unwrap_or(*up);
    let y_axis = up.cross(&view);
    Matrix3::from_columns(&[view, y_axis, up])
}

/// The frame of a spatial object: its orientation and origin, both
/// expressed in the enclosing (usually global) frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub rotation: Matrix3<f64>,
    pub origin: Vector3<f64>,
}

impl Frame {
    /// The global frame.
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            origin: Vector3::zeros(),
        }
    }

    pub fn from_pose(position: Vector3<f64>, view: Vector3<f64>, up: Vector3<f64>) -> Self {
        Self {
            rotation: rotation_from_view_up(&view, &up),
            origin: position,
        }
    }

    /// Local → enclosing: rotate, then translate positions.
    pub fn to_global(&self, local: &Vector3<f64>, is_position: bool) -> Vector3<f64> {
        let rotated = self.rotation * local;
        if is_position {
            rotated + self.origin
        } else {
            rotated
        }
    }

    /// Enclosing → local: translate positions back, then apply the inverse
    /// rotation.
    pub fn to_local(&self, global: &Vector3<f64>, is_position: bool) -> Vector3<f64> {
        let shifted = if is_position {
            global - self.origin
        } else {
            *global
        };
        self.rotation.transpose() * shifted
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}
