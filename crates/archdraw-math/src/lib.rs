#![warn(missing_docs)]

//! Math types for the archdraw drawing engine.
//!
//! Thin wrappers around nalgebra providing the 3D points, vectors and
//! placements used by building models, plus the shared tolerance that
//! every classification in the drafting pipeline agrees on.

use nalgebra::{Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Shared epsilon for front/back and on-plane classification.
pub const EPSILON: f64 = 1e-10;

/// A 4x4 affine placement matrix.
///
/// Serialized as a row-major `[[f64; 4]; 4]` so model documents stay plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 4]; 4]", into = "[[f64; 4]; 4]")]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Rotation about the vertical (Z) axis by `angle` radians.
    ///
    /// Building elements are placed in plan, so this is the only rotation
    /// placements need.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[[f64; 4]; 4]> for Transform {
    fn from(rows: [[f64; 4]; 4]) -> Self {
        Self {
            matrix: Matrix4::from_fn(|r, c| rows[r][c]),
        }
    }
}

impl From<Transform> for [[f64; 4]; 4] {
    fn from(t: Transform) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = t.matrix[(r, c)];
            }
        }
        rows
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Distance below which a point is considered on a plane / coincident.
    pub linear: f64,
    /// Bound on dot products when checking that a basis is orthonormal.
    pub orthogonality: f64,
}

impl Tolerance {
    /// Drafting tolerances (1e-10 linear, 1e-9 orthogonality).
    pub const DEFAULT: Self = Self {
        linear: EPSILON,
        orthogonality: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() <= self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Arithmetic mean of a point set, `None` when empty.
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Normalize `v`, returning `None` for (near) zero-length input.
pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
    let len = v.norm();
    if len > EPSILON && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Convert a point to a plain array.
pub fn to_array(p: &Point3) -> [f64; 3] {
    [p.x, p.y, p.z]
}

/// Convert a plain array to a point.
pub fn from_array(a: [f64; 3]) -> Point3 {
    Point3::new(a[0], a[1], a[2])
}
