//! Orthographic projection: view basis construction and mesh projection.
//!
//! A view is defined by a view direction pointing from the model towards the
//! viewer and an up vector. The basis is
//!
//! - `forward = -normalize(view_direction)`
//! - `right = normalize(forward × up)`
//! - `true_up = normalize(right × forward)`
//!
//! and a point `p` maps to `((p - anchor)·right, (p - anchor)·true_up)`.

use std::collections::HashMap;

use archdraw_math::{centroid, to_array, try_normalize, Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{DraftingError, Result};
use crate::types::{
    compute_face_normal, BoundingBox2D, FaceClass, FaceNormal, LineStyle, Point2D, ProjectedEdge,
    ProjectedFace, ProjectedVertex,
};

/// Below this |forward × up| the up vector is treated as parallel to the view.
const PARALLEL_TOLERANCE: f64 = 1e-6;

/// Orthonormal drawing frame derived from a view direction and up vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
    /// Drawing +X in model space.
    pub right: Vec3,
    /// Drawing +Y in model space.
    pub up: Vec3,
    /// Direction the viewer looks in (`-view_direction`).
    pub forward: Vec3,
    /// Unit vector from the model towards the viewer.
    pub view_direction: Vec3,
    /// True when the supplied up vector was zero or parallel to the view and
    /// a canonical one was used instead.
    pub up_substituted: bool,
}

impl ViewBasis {
    /// Build a basis; fails only for a zero or non-finite view direction.
    pub fn new(view_direction: Vec3, up: Vec3) -> Result<Self> {
        let view_direction = try_normalize(&view_direction).ok_or_else(|| {
            DraftingError::InvalidViewDirection(format!(
                "({}, {}, {}) has no direction",
                view_direction.x, view_direction.y, view_direction.z
            ))
        })?;
        let forward = -view_direction;

        let (up, up_substituted) = match try_normalize(&up) {
            Some(u) if forward.cross(&u).norm() > PARALLEL_TOLERANCE => (u, false),
            _ => (canonical_up(&forward), true),
        };

        let right = forward.cross(&up).normalize();
        let true_up = right.cross(&forward).normalize();

        Ok(Self {
            right,
            up: true_up,
            forward,
            view_direction,
            up_substituted,
        })
    }

    /// Drawing coordinates of a model-space offset vector.
    pub fn to_view(&self, v: &Vec3) -> Point2D {
        Point2D::new(v.dot(&self.right), v.dot(&self.up))
    }

    /// Signed distance of an offset vector along the view direction.
    pub fn depth(&self, v: &Vec3) -> f64 {
        v.dot(&self.view_direction)
    }

    /// Check unit length and mutual orthogonality within `tolerance`.
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |v: &Vec3| (v.norm() - 1.0).abs() <= tolerance;
        unit(&self.right)
            && unit(&self.up)
            && unit(&self.forward)
            && self.right.dot(&self.up).abs() <= tolerance
            && self.right.dot(&self.forward).abs() <= tolerance
            && self.up.dot(&self.forward).abs() <= tolerance
    }
}

/// World +Z, or +Y when looking straight up or down.
fn canonical_up(forward: &Vec3) -> Vec3 {
    if forward.cross(&Vec3::z()).norm() > PARALLEL_TOLERANCE {
        Vec3::z()
    } else {
        Vec3::y()
    }
}

/// Reference point subtracted before projecting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionAnchor {
    /// Centroid of the vertex set passed to each call.
    #[default]
    Centroid,
    /// The model origin; coordinates are comparable across calls.
    WorldOrigin,
    /// A fixed model-space point (e.g. a section plane origin).
    Fixed([f64; 3]),
}

/// Orthographic projector with front-face visibility.
#[derive(Debug, Clone)]
pub struct Projector {
    basis: ViewBasis,
    hidden_line_removal: bool,
    anchor: ProjectionAnchor,
    tolerance: Tolerance,
}

impl Projector {
    /// Create a projector from a view direction and up vector.
    pub fn new(view_direction: Vec3, up: Vec3, hidden_line_removal: bool) -> Result<Self> {
        Ok(Self::from_basis(
            ViewBasis::new(view_direction, up)?,
            hidden_line_removal,
        ))
    }

    /// Create a projector from an existing basis.
    pub fn from_basis(basis: ViewBasis, hidden_line_removal: bool) -> Self {
        Self {
            basis,
            hidden_line_removal,
            anchor: ProjectionAnchor::Centroid,
            tolerance: Tolerance::DEFAULT,
        }
    }

    /// Use a different reference point.
    pub fn with_anchor(mut self, anchor: ProjectionAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// The view basis.
    pub fn basis(&self) -> &ViewBasis {
        &self.basis
    }

    /// Whether invisible edges and faces are dropped.
    pub fn hidden_line_removal(&self) -> bool {
        self.hidden_line_removal
    }

    /// Reference point for a vertex set under the configured anchor.
    pub fn reference_point(&self, vertices: &[Point3]) -> Point3 {
        match self.anchor {
            ProjectionAnchor::Centroid => centroid(vertices).unwrap_or_else(Point3::origin),
            ProjectionAnchor::WorldOrigin => Point3::origin(),
            ProjectionAnchor::Fixed(p) => Point3::new(p[0], p[1], p[2]),
        }
    }

    /// Project a point relative to `reference`.
    pub fn project_point(&self, p: &Point3, reference: &Point3) -> Point2D {
        self.basis.to_view(&(p - reference))
    }

    /// Project a vertex set to drawing coordinates.
    pub fn project(&self, vertices: &[Point3]) -> Vec<Point2D> {
        let reference = self.reference_point(vertices);
        vertices
            .iter()
            .map(|p| self.project_point(p, &reference))
            .collect()
    }

    /// Signed distance of `vertex` along the view direction relative to `reference`.
    ///
    /// Used only for edge-visibility heuristics, not as a depth buffer.
    pub fn get_depth(&self, vertex: &Point3, reference: &Point3) -> f64 {
        self.basis.depth(&(vertex - reference))
    }

    /// Face normal from the first two edges, flagged unreliable when degenerate.
    pub fn compute_face_normal(&self, face: &[Point3]) -> FaceNormal {
        compute_face_normal(face)
    }

    /// Front-face test; edge-on faces (within ε) are not visible.
    ///
    /// The normal is normalized first so the result does not depend on its length.
    pub fn is_face_visible(&self, normal: &Vec3) -> bool {
        match try_normalize(normal) {
            Some(n) => n.dot(&self.basis.view_direction) > self.tolerance.linear,
            None => false,
        }
    }

    /// Project a polygon mesh.
    ///
    /// Edges are derived from face loops (undirected, de-duplicated) when
    /// `edges` is `None`. An edge is visible when at least one adjacent face
    /// is visible; free edges with no adjacent face are always visible.
    pub fn project_mesh(
        &self,
        vertices: &[Point3],
        faces: &[Vec<u32>],
        edges: Option<&[(u32, u32)]>,
    ) -> ProjectedMesh {
        let mut mesh = ProjectedMesh::new(self.basis.view_direction);
        if vertices.is_empty() {
            return mesh;
        }

        let reference = self.reference_point(vertices);
        let n = vertices.len();

        // Faces first so vertex visibility can be derived from them.
        let mut face_visible = Vec::with_capacity(faces.len());
        let mut vertex_visible = vec![false; n];
        let mut projected_faces = Vec::with_capacity(faces.len());
        for face in faces {
            let in_range = face.iter().all(|&i| (i as usize) < n);
            let points: Vec<Point3> = if in_range {
                face.iter().map(|&i| vertices[i as usize]).collect()
            } else {
                Vec::new()
            };
            let FaceNormal { normal, reliable } = compute_face_normal(&points);
            let visible = reliable && self.is_face_visible(&normal);
            face_visible.push(visible);
            if visible {
                for &i in face {
                    vertex_visible[i as usize] = true;
                }
            }
            projected_faces.push(ProjectedFace {
                vertices: if in_range {
                    face.iter().map(|&i| i as usize).collect()
                } else {
                    Vec::new()
                },
                normal: to_array(&Point3::from(normal)),
                centroid: to_array(&centroid(&points).unwrap_or_else(Point3::origin)),
                visible,
                class: if visible {
                    FaceClass::Exterior
                } else {
                    FaceClass::Interior
                },
                hatch: None,
                reliable,
            });
        }

        let adjacency = edge_adjacency(faces, n);
        let derived;
        let edge_list: &[(u32, u32)] = match edges {
            Some(list) => list,
            None => {
                derived = adjacency.order.clone();
                &derived
            }
        };
        if faces.is_empty() {
            vertex_visible.iter_mut().for_each(|v| *v = true);
        }

        mesh.vertices = vertices
            .iter()
            .zip(&vertex_visible)
            .map(|(p, &visible)| ProjectedVertex {
                position: self.project_point(p, &reference),
                depth: self.get_depth(p, &reference),
                visible,
            })
            .collect();

        for &(a, b) in edge_list {
            let (ia, ib) = (a as usize, b as usize);
            if ia >= n || ib >= n || ia == ib {
                continue;
            }
            let visible = match adjacency.faces.get(&edge_key(a, b)) {
                Some(adjacent) => adjacent.iter().any(|&f| face_visible[f]),
                None => true,
            };
            if !visible && self.hidden_line_removal {
                continue;
            }
            mesh.edges.push(ProjectedEdge {
                start: mesh.vertices[ia],
                end: mesh.vertices[ib],
                visible,
                style: if visible {
                    LineStyle::Solid
                } else {
                    LineStyle::Hidden
                },
            });
        }

        mesh.faces = if self.hidden_line_removal {
            projected_faces.into_iter().filter(|f| f.visible).collect()
        } else {
            projected_faces
        };

        mesh.bounds = BoundingBox2D::from_points(mesh.vertices.iter().map(|v| &v.position));
        mesh
    }
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

struct EdgeAdjacency {
    /// Undirected edges in first-seen order.
    order: Vec<(u32, u32)>,
    /// Faces adjacent to each edge.
    faces: HashMap<(u32, u32), Vec<usize>>,
}

fn edge_adjacency(faces: &[Vec<u32>], vertex_count: usize) -> EdgeAdjacency {
    let mut order = Vec::new();
    let mut adjacency: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 2 || face.iter().any(|&i| i as usize >= vertex_count) {
            continue;
        }
        for k in 0..face.len() {
            let a = face[k];
            let b = face[(k + 1) % face.len()];
            if a == b {
                continue;
            }
            let key = edge_key(a, b);
            let entry = adjacency.entry(key).or_default();
            if entry.is_empty() {
                order.push(key);
            }
            if !entry.contains(&fi) {
                entry.push(fi);
            }
        }
    }
    EdgeAdjacency {
        order,
        faces: adjacency,
    }
}

/// Result of projecting one or more meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedMesh {
    /// Projected vertices (same order as the input).
    pub vertices: Vec<ProjectedVertex>,
    /// Projected faces.
    pub faces: Vec<ProjectedFace>,
    /// Projected edges.
    pub edges: Vec<ProjectedEdge>,
    /// 2D bounds; `(0, 0, 0, 0)` when empty.
    pub bounds: BoundingBox2D,
    /// Unit view direction `[x, y, z]` used for the projection.
    pub view_direction: [f64; 3],
}

impl ProjectedMesh {
    /// Create an empty result.
    pub fn new(view_direction: Vec3) -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            edges: Vec::new(),
            bounds: BoundingBox2D::zero(),
            view_direction: [view_direction.x, view_direction.y, view_direction.z],
        }
    }

    /// True if nothing was projected.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Append another projection, re-indexing its faces.
    pub fn merge(&mut self, other: ProjectedMesh) {
        if other.is_empty() {
            return;
        }
        let offset = self.vertices.len();
        let was_empty = self.is_empty();
        self.vertices.extend(other.vertices);
        self.edges.extend(other.edges);
        self.faces.extend(other.faces.into_iter().map(|mut f| {
            f.vertices.iter_mut().for_each(|i| *i += offset);
            f
        }));
        if was_empty {
            self.bounds = other.bounds;
        } else {
            self.bounds.include_box(&other.bounds);
        }
    }

    /// Get only visible edges.
    pub fn visible_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges.iter().filter(|e| e.visible)
    }

    /// Get only hidden edges.
    pub fn hidden_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges.iter().filter(|e| !e.visible)
    }

    /// Number of visible edges.
    pub fn num_visible(&self) -> usize {
        self.visible_edges().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Cube with half-extent `h` centered at the origin, outward quads.
    fn make_cube(h: f64) -> (Vec<Point3>, Vec<Vec<u32>>) {
        let vertices = vec![
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];
        let faces = vec![
            vec![3, 2, 1, 0],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
        ];
        (vertices, faces)
    }

    #[test]
    fn test_basis_orthonormal() {
        let dirs = [
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-0.3, 0.9, 0.1),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let ups = [Vec3::z(), Vec3::y(), Vec3::new(1.0, 1.0, 0.0)];
        for d in dirs {
            for u in ups {
                let basis = ViewBasis::new(d, u).unwrap();
                assert!(basis.is_orthonormal(1e-9), "basis for {d:?}/{u:?}");
            }
        }
    }

    #[test]
    fn test_parallel_up_substituted() {
        let basis = ViewBasis::new(Vec3::new(0.0, 0.0, 5.0), Vec3::z()).unwrap();
        assert!(basis.up_substituted);
        assert!(basis.is_orthonormal(1e-9));
        assert_relative_eq!(basis.up.y.abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_view_direction_rejected() {
        assert!(matches!(
            ViewBasis::new(Vec3::zeros(), Vec3::z()),
            Err(DraftingError::InvalidViewDirection(_))
        ));
    }

    #[test]
    fn test_top_view_basis() {
        let basis = ViewBasis::new(Vec3::new(0.0, 0.0, -1.0), Vec3::y()).unwrap();
        assert_relative_eq!(basis.right.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(basis.up.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_mesh() {
        let projector = Projector::new(Vec3::z(), Vec3::y(), true).unwrap();
        let mesh = projector.project_mesh(&[], &[], None);
        assert!(mesh.is_empty());
        assert!(mesh.edges.is_empty());
        assert_eq!(mesh.bounds, BoundingBox2D::zero());
    }

    #[test]
    fn test_visibility_scale_invariant() {
        let projector = Projector::new(Vec3::new(0.3, -0.2, 0.9), Vec3::z(), false).unwrap();
        let normals = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, -0.2),
            Vec3::new(-0.5, 0.5, 0.1),
        ];
        for n in normals {
            let expected = projector.is_face_visible(&n);
            for s in [1e-6, 0.5, 3.0, 1e6] {
                assert_eq!(projector.is_face_visible(&(n * s)), expected);
            }
        }
    }

    #[test]
    fn test_edge_on_face_not_visible() {
        let projector = Projector::new(Vec3::z(), Vec3::y(), false).unwrap();
        assert!(!projector.is_face_visible(&Vec3::x()));
        assert!(!projector.is_face_visible(&Vec3::zeros()));
    }

    #[test]
    fn test_cube_edges_deduplicated() {
        let (vertices, faces) = make_cube(1.0);
        let projector = Projector::new(Vec3::new(1.0, 1.0, 1.0), Vec3::z(), false).unwrap();
        let mesh = projector.project_mesh(&vertices, &faces, None);
        assert_eq!(mesh.edges.len(), 12);
        assert_eq!(mesh.faces.len(), 6);
        // Three faces point at the viewer; their 9 edges are visible.
        assert_eq!(mesh.faces.iter().filter(|f| f.visible).count(), 3);
        assert_eq!(mesh.num_visible(), 9);
        assert_eq!(mesh.hidden_edges().count(), 3);
    }

    #[test]
    fn test_hidden_line_removal_drops_hidden() {
        let (vertices, faces) = make_cube(1.0);
        let projector = Projector::new(Vec3::new(1.0, 1.0, 1.0), Vec3::z(), true).unwrap();
        assert!(projector.hidden_line_removal());
        let mesh = projector.project_mesh(&vertices, &faces, None);
        assert_eq!(mesh.edges.len(), 9);
        assert!(mesh.edges.iter().all(|e| e.style == LineStyle::Solid));
        assert_eq!(mesh.faces.len(), 3);
    }

    #[test]
    fn test_centroid_and_world_anchor() {
        let pts = vec![Point3::new(10.0, 0.0, 0.0), Point3::new(12.0, 0.0, 0.0)];
        let top = Projector::new(Vec3::z(), Vec3::y(), false).unwrap();
        let centered = top.project(&pts);
        assert_relative_eq!(centered[0].x, -1.0, epsilon = 1e-12);
        let world = top.clone().with_anchor(ProjectionAnchor::WorldOrigin).project(&pts);
        assert_relative_eq!(world[0].x, 10.0, epsilon = 1e-12);
        // Relative coordinates agree under either anchor.
        assert_relative_eq!(
            centered[1].x - centered[0].x,
            world[1].x - world[0].x,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_depth_along_view_direction() {
        let projector = Projector::new(Vec3::z(), Vec3::y(), false).unwrap();
        let reference = Point3::origin();
        assert_relative_eq!(
            projector.get_depth(&Point3::new(4.0, 1.0, 2.0), &reference),
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_explicit_edges_and_free_edges() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 0.0),
        ];
        // Triangle facing -Z, viewed from +Z: back-facing.
        let faces = vec![vec![0, 2, 1]];
        let projector = Projector::new(Vec3::z(), Vec3::y(), false).unwrap();
        let mesh = projector.project_mesh(&vertices, &faces, Some(&[(0, 1), (2, 3)]));
        assert_eq!(mesh.edges.len(), 2);
        assert!(!mesh.edges[0].visible, "edge of back face is hidden");
        assert!(mesh.edges[1].visible, "free edge is visible");
    }

    #[test]
    fn test_degenerate_face_marked_unreliable() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let projector = Projector::new(Vec3::z(), Vec3::y(), false).unwrap();
        let mesh = projector.project_mesh(&vertices, &[vec![0, 1], vec![0, 1, 9]], None);
        assert_eq!(mesh.faces.len(), 2);
        assert!(mesh.faces.iter().all(|f| !f.reliable && !f.visible));
    }
}
