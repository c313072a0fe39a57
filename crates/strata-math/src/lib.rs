#![warn(missing_docs)]

//! Math types for the strata slicer.
//!
//! Thin wrappers around nalgebra providing the point and vector types
//! used throughout slicing, the affine transform used to place a model
//! on the print bed, and the shared tolerance for floating-point tests.

use nalgebra::{Matrix4, Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in the 2D slicing plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in the 2D slicing plane.
pub type Vec2 = Vector2<f64>;

/// Affine placement of a model: homogeneous 4x4 matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Homogeneous matrix, column vectors.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Shift by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vec3::new(dx, dy, dz)),
        }
    }

    /// Scale every axis by `s` about the origin.
    pub fn uniform_scale(s: f64) -> Self {
        Self {
            matrix: Matrix4::new_scaling(s),
        }
    }

    /// `self * other`: the result applies `other` first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Map a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }
}

/// Tolerance for geometric comparisons.
///
/// Every on-plane test, endpoint match and orientation check in the
/// slicer goes through [`Tolerance::DEFAULT`] so that contour stitching
/// and orientation agree on what "zero" means.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
}

impl Tolerance {
    /// Default slicing tolerance (1e-6 mm).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if an area is effectively zero (below the squared tolerance).
    pub fn is_zero_area(&self, area: f64) -> bool {
        area.abs() < self.linear * self.linear
    }

    /// Snap a coordinate onto the tolerance grid.
    ///
    /// Two coordinates closer than half a tolerance step usually share a
    /// grid cell; identical coordinates always do.
    pub fn grid(&self, v: f64) -> i64 {
        (v / self.linear).round() as i64
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
