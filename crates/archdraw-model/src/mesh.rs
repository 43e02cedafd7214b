//! Polygon meshes attached to building elements.

use archdraw_math::{from_array, Point3};
use serde::{Deserialize, Serialize};

/// Vertices plus polygonal faces (index loops of any arity).
///
/// Faces are wound counter-clockwise when seen from outside the element, so
/// the cross product of the first two edges points outward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementMesh {
    /// Vertex positions `[x, y, z]` in element-local coordinates.
    pub vertices: Vec<[f64; 3]>,
    /// Faces as ordered loops of vertex indices.
    pub faces: Vec<Vec<u32>>,
}

impl ElementMesh {
    /// Create a mesh from raw vertices and faces.
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<Vec<u32>>) -> Self {
        Self { vertices, faces }
    }

    /// Axis-aligned box between `min` and `max` with six outward-facing quads.
    pub fn cuboid(min: [f64; 3], max: [f64; 3]) -> Self {
        let footprint = [
            [min[0], min[1]],
            [max[0], min[1]],
            [max[0], max[1]],
            [min[0], max[1]],
        ];
        Self::extruded(&footprint, min[2], max[2])
    }

    /// Prism obtained by extruding a counter-clockwise footprint from `base` to `top`.
    ///
    /// Vertices `0..n` form the bottom ring and `n..2n` the top ring.
    pub fn extruded(footprint: &[[f64; 2]], base: f64, top: f64) -> Self {
        let n = footprint.len();
        if n < 3 {
            return Self::default();
        }

        let mut vertices = Vec::with_capacity(n * 2);
        vertices.extend(footprint.iter().map(|p| [p[0], p[1], base]));
        vertices.extend(footprint.iter().map(|p| [p[0], p[1], top]));

        let n32 = n as u32;
        let mut faces = Vec::with_capacity(n + 2);
        faces.push((0..n32).rev().collect());
        faces.push((n32..2 * n32).collect());
        for i in 0..n32 {
            let j = (i + 1) % n32;
            faces.push(vec![i, j, n32 + j, n32 + i]);
        }

        Self { vertices, faces }
    }

    /// True when the mesh has no vertices or no faces.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Vertex positions as points.
    pub fn points(&self) -> Vec<Point3> {
        self.vertices.iter().copied().map(from_array).collect()
    }

    /// Minimum and maximum Z over all vertices.
    pub fn z_extent(&self) -> Option<(f64, f64)> {
        self.vertices.iter().fold(None, |acc, v| match acc {
            None => Some((v[2], v[2])),
            Some((lo, hi)) => Some((lo.min(v[2]), hi.max(v[2]))),
        })
    }

    /// Index of the first face referencing a vertex that does not exist.
    pub fn first_invalid_face(&self) -> Option<(usize, u32)> {
        let count = self.vertices.len() as u32;
        self.faces.iter().enumerate().find_map(|(fi, face)| {
            face.iter().find(|&&idx| idx >= count).map(|&idx| (fi, idx))
        })
    }
}
