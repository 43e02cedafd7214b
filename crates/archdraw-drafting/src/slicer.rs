//! Plane slicing of polygon meshes.
//!
//! Vertices are labelled FRONT (kept side), BACK or ON against a
//! [`SectionPlane`]; faces straddling the plane are clipped with a
//! plane-extended Sutherland–Hodgman pass that keeps the FRONT portion, and
//! the resulting cut segments are chained into closed loops in the plane's
//! own 2D frame.

use std::collections::{HashMap, HashSet};

use archdraw_math::{Point3, Vec3, EPSILON};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hatch::point_in_polygon;
use crate::projection::ViewBasis;
use crate::types::{Point2D, SectionPlane};

/// Grid used to merge cut points coming from different faces.
const CHAIN_TOLERANCE: f64 = 1e-9;

/// Position of a vertex relative to the cutting plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Signed distance above ε (kept half-space).
    Front,
    /// Signed distance below −ε.
    Back,
    /// Within ε of the plane.
    On,
}

/// How a single face meets the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceCase {
    /// No BACK vertex and no edge on the plane; kept whole.
    AllFront,
    /// No FRONT vertex and no edge on the plane; discarded.
    AllBack,
    /// Every vertex ON; the face is a cut face.
    Coplanar,
    /// An edge lies on the plane and the rest of the face is on one side.
    EdgeOnPlane,
    /// One ON vertex with a FRONT and a BACK neighbour.
    VertexTransition,
    /// FRONT and BACK vertices on both sides; clipped.
    Crossing,
    /// Fewer than three vertices.
    Degenerate,
}

/// Outcome of slicing one face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSlice {
    /// Case analysis result.
    pub case: SliceCase,
    /// Per-vertex labels in loop order.
    pub labels: Vec<Side>,
    /// Portion of the face on the FRONT side, if any.
    pub kept: Option<Vec<Point3>>,
    /// Segments where the face meets the plane.
    pub cut_edges: Vec<(Point3, Point3)>,
    /// Edges from an ON vertex to its FRONT and BACK neighbours.
    pub transition_edges: Vec<(Point3, Point3)>,
}

/// A FRONT polygon with the index of the face it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct KeptFace {
    /// Index of the source face.
    pub source: usize,
    /// Polygon in model space.
    pub points: Vec<Point3>,
}

/// Outcome of slicing a whole mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceResult {
    /// Label of every input vertex.
    pub labels: Vec<Side>,
    /// FRONT portions of faces (whole or clipped).
    pub kept_faces: Vec<KeptFace>,
    /// Faces lying in the plane.
    pub cut_faces: Vec<KeptFace>,
    /// De-duplicated cut segments.
    pub cut_edges: Vec<(Point3, Point3)>,
    /// De-duplicated transition edges.
    pub transition_edges: Vec<(Point3, Point3)>,
    /// Faces skipped for too few vertices or out-of-range indices.
    pub degenerate_faces: Vec<usize>,
}

impl SliceResult {
    /// Number of vertices with the given label.
    pub fn count(&self, side: Side) -> usize {
        self.labels.iter().filter(|&&s| s == side).count()
    }

    /// True when the plane does not touch the mesh.
    pub fn is_uncut(&self) -> bool {
        self.cut_edges.is_empty() && self.cut_faces.is_empty()
    }
}

/// A chained cut loop in plane coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutLoop {
    /// Loop vertices (without a repeated closing point).
    pub points: Vec<Point2D>,
    /// False when the chain did not close.
    pub closed: bool,
    /// Signed area; positive for outer loops, negative for holes, 0 when open.
    pub area: f64,
    /// True when nested inside an odd number of other loops.
    pub is_hole: bool,
}

/// Slices meshes against one plane.
#[derive(Debug, Clone)]
pub struct PlaneSlicer {
    plane: SectionPlane,
    origin: Point3,
    normal: Vec3,
    basis: ViewBasis,
    epsilon: f64,
}

impl PlaneSlicer {
    /// Create a slicer; the plane is validated first.
    ///
    /// The 2D frame looks along the plane normal, so a horizontal plan cut
    /// maps model X/Y to drawing X/Y.
    pub fn new(plane: &SectionPlane) -> Result<Self> {
        plane.validate()?;
        let normal = plane.normal_vec().normalize();
        let basis = ViewBasis::new(-normal, plane.up_vec())?;
        Ok(Self {
            plane: plane.clone(),
            origin: plane.origin_point(),
            normal,
            basis,
            epsilon: EPSILON,
        })
    }

    /// The cutting plane.
    pub fn plane(&self) -> &SectionPlane {
        &self.plane
    }

    /// The plane's 2D frame.
    pub fn basis(&self) -> &ViewBasis {
        &self.basis
    }

    /// `(p − origin)·normal`.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.normal)
    }

    /// Label a point.
    pub fn classify(&self, p: &Point3) -> Side {
        let d = self.signed_distance(p);
        if d > self.epsilon {
            Side::Front
        } else if d < -self.epsilon {
            Side::Back
        } else {
            Side::On
        }
    }

    /// Label every point.
    pub fn classify_all(&self, points: &[Point3]) -> Vec<Side> {
        points.iter().map(|p| self.classify(p)).collect()
    }

    /// Plane coordinates of a model-space point.
    pub fn to_plane_2d(&self, p: &Point3) -> Point2D {
        self.basis.to_view(&(p - self.origin))
    }

    /// Slice one polygon.
    pub fn slice_face(&self, points: &[Point3]) -> FaceSlice {
        let labels = self.classify_all(points);
        let n = points.len();
        let mut slice = FaceSlice {
            case: SliceCase::Degenerate,
            labels,
            kept: None,
            cut_edges: Vec::new(),
            transition_edges: Vec::new(),
        };
        if n < 3 {
            return slice;
        }

        let labels = &slice.labels;
        let front = labels.iter().filter(|&&s| s == Side::Front).count();
        let back = labels.iter().filter(|&&s| s == Side::Back).count();

        if front == 0 && back == 0 {
            slice.case = SliceCase::Coplanar;
            return slice;
        }

        // Edges lying in the plane are cut edges as they stand.
        let on_edges: Vec<(Point3, Point3)> = (0..n)
            .filter(|&i| labels[i] == Side::On && labels[(i + 1) % n] == Side::On)
            .map(|i| (points[i], points[(i + 1) % n]))
            .collect();

        if back == 0 || front == 0 {
            if back == 0 {
                slice.kept = Some(points.to_vec());
            }
            slice.case = match (on_edges.is_empty(), back == 0) {
                (true, true) => SliceCase::AllFront,
                (true, false) => SliceCase::AllBack,
                (false, _) => SliceCase::EdgeOnPlane,
            };
            slice.cut_edges = on_edges;
            return slice;
        }

        // Mixed face: ON vertices that separate a FRONT and a BACK neighbour
        // produce transition edges and anchor the cut segment.
        let mut crossings = Vec::new();
        let mut transitions = Vec::new();
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            match labels[i] {
                Side::On => {
                    let sides = (labels[prev], labels[next]);
                    if matches!(sides, (Side::Front, Side::Back) | (Side::Back, Side::Front)) {
                        crossings.push(points[i]);
                        transitions.push((points[i], points[prev]));
                        transitions.push((points[i], points[next]));
                    }
                }
                side => {
                    let other = labels[next];
                    if (side == Side::Front && other == Side::Back)
                        || (side == Side::Back && other == Side::Front)
                    {
                        crossings.push(self.edge_intersection(&points[i], &points[next]));
                    }
                }
            }
        }

        let on_count = n - front - back;
        slice.case = if on_count == 1 && !transitions.is_empty() {
            SliceCase::VertexTransition
        } else {
            SliceCase::Crossing
        };
        slice.kept = Some(self.clip_front(points));
        slice.cut_edges = on_edges;
        slice.cut_edges.extend(pair_along_line(crossings));
        slice.transition_edges = transitions;
        slice
    }

    /// Sutherland–Hodgman against the plane, keeping `d ≥ −ε`.
    fn clip_front(&self, points: &[Point3]) -> Vec<Point3> {
        let n = points.len();
        let mut out = Vec::with_capacity(n + 2);
        for i in 0..n {
            let cur = &points[i];
            let next = &points[(i + 1) % n];
            let (sc, sn) = (self.classify(cur), self.classify(next));
            if sc != Side::Back {
                out.push(*cur);
            }
            if (sc == Side::Front && sn == Side::Back) || (sc == Side::Back && sn == Side::Front) {
                out.push(self.edge_intersection(cur, next));
            }
        }
        out
    }

    /// Point where segment `a`–`b` crosses the plane.
    ///
    /// Endpoints are put in lexicographic order first so both faces sharing
    /// an edge compute bit-identical points.
    fn edge_intersection(&self, a: &Point3, b: &Point3) -> Point3 {
        let (a, b) = if lexicographic_lt(a, b) { (a, b) } else { (b, a) };
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        let t = da / (da - db);
        let p = a + (b - a) * t;
        p - self.normal * self.signed_distance(&p)
    }

    /// Slice an indexed mesh.
    pub fn slice_mesh(&self, vertices: &[Point3], faces: &[Vec<u32>]) -> SliceResult {
        let mut result = SliceResult {
            labels: self.classify_all(vertices),
            ..SliceResult::default()
        };
        let mut cut_keys = HashSet::new();
        let mut transition_keys = HashSet::new();
        let mut coplanar_edges: Vec<((Point3, Point3), usize)> = Vec::new();
        let mut coplanar_index: HashMap<EdgeKey, usize> = HashMap::new();

        for (fi, face) in faces.iter().enumerate() {
            let Some(points) = face
                .iter()
                .map(|&i| vertices.get(i as usize).copied())
                .collect::<Option<Vec<_>>>()
            else {
                result.degenerate_faces.push(fi);
                continue;
            };

            let slice = self.slice_face(&points);
            match slice.case {
                SliceCase::Degenerate => result.degenerate_faces.push(fi),
                SliceCase::Coplanar => {
                    // Count boundary usage; edges shared by two coplanar faces
                    // are interior to the cut region.
                    for k in 0..points.len() {
                        let e = (points[k], points[(k + 1) % points.len()]);
                        let key = edge_key(&e.0, &e.1);
                        match coplanar_index.get(&key) {
                            Some(&slot) => coplanar_edges[slot].1 += 1,
                            None => {
                                coplanar_index.insert(key, coplanar_edges.len());
                                coplanar_edges.push((e, 1));
                            }
                        }
                    }
                    result.cut_faces.push(KeptFace { source: fi, points });
                }
                _ => {}
            }

            if let Some(kept) = slice.kept {
                result.kept_faces.push(KeptFace {
                    source: fi,
                    points: kept,
                });
            }
            for e in slice.cut_edges {
                push_unique(&mut result.cut_edges, &mut cut_keys, e);
            }
            for e in slice.transition_edges {
                push_unique(&mut result.transition_edges, &mut transition_keys, e);
            }
        }

        for (e, uses) in coplanar_edges {
            if uses == 1 {
                push_unique(&mut result.cut_edges, &mut cut_keys, e);
            }
        }

        tracing::debug!(
            faces = faces.len(),
            kept = result.kept_faces.len(),
            cut_edges = result.cut_edges.len(),
            "sliced mesh"
        );
        result
    }

    /// Chain cut edges into loops in plane coordinates.
    ///
    /// Disjoint loops stay separate. Closed loops nested inside an odd number
    /// of other loops are holes and wound clockwise; all other closed loops
    /// are wound counter-clockwise. Chains that do not close are returned
    /// with `closed = false`.
    pub fn compute_cut_polygon(&self, result: &SliceResult) -> Vec<CutLoop> {
        let chains = chain_segments(&result.cut_edges, CHAIN_TOLERANCE);
        let mut loops: Vec<CutLoop> = chains
            .into_iter()
            .filter_map(|(chain, closed)| {
                let points: Vec<Point2D> = chain.iter().map(|p| self.to_plane_2d(p)).collect();
                if !closed {
                    return Some(CutLoop {
                        points,
                        closed,
                        area: 0.0,
                        is_hole: false,
                    });
                }
                let area = signed_area(&points);
                (area.abs() > self.epsilon).then_some(CutLoop {
                    points,
                    closed,
                    area,
                    is_hole: false,
                })
            })
            .collect();

        let depths: Vec<usize> = loops
            .iter()
            .enumerate()
            .map(|(i, l)| {
                if !l.closed {
                    return 0;
                }
                let probe = l.points[0].midpoint(&l.points[1]);
                loops
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| {
                        *j != i && other.closed && point_in_polygon(&probe, &other.points)
                    })
                    .count()
            })
            .collect();

        for (l, depth) in loops.iter_mut().zip(depths) {
            if !l.closed {
                continue;
            }
            l.is_hole = depth % 2 == 1;
            let wants_positive = !l.is_hole;
            if (l.area > 0.0) != wants_positive {
                l.points.reverse();
                l.area = -l.area;
            }
        }
        loops
    }
}

fn lexicographic_lt(a: &Point3, b: &Point3) -> bool {
    (a.x, a.y, a.z) < (b.x, b.y, b.z)
}

type PointKey = (i64, i64, i64);
type EdgeKey = (PointKey, PointKey);

fn point_key(p: &Point3, tolerance: f64) -> PointKey {
    let scale = 1.0 / tolerance;
    (
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    )
}

fn edge_key(a: &Point3, b: &Point3) -> EdgeKey {
    let (ka, kb) = (point_key(a, CHAIN_TOLERANCE), point_key(b, CHAIN_TOLERANCE));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

fn push_unique(
    edges: &mut Vec<(Point3, Point3)>,
    seen: &mut HashSet<EdgeKey>,
    e: (Point3, Point3),
) {
    let key = edge_key(&e.0, &e.1);
    if key.0 == key.1 {
        return;
    }
    if seen.insert(key) {
        edges.push(e);
    }
}

/// Sort collinear points along their spread and pair them up (even-odd).
fn pair_along_line(mut points: Vec<Point3>) -> Vec<(Point3, Point3)> {
    if points.len() < 2 {
        return Vec::new();
    }
    let first = points[0];
    let far = points
        .iter()
        .copied()
        .max_by(|a, b| (a - first).norm().total_cmp(&(b - first).norm()))
        .unwrap_or(first);
    let dir = far - first;
    points.sort_by(|a, b| (a - first).dot(&dir).total_cmp(&(b - first).dot(&dir)));
    points
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .filter(|(a, b)| (a - b).norm() > EPSILON)
        .collect()
}

/// Shoelace area; positive for counter-clockwise loops.
pub fn signed_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (&points[i], &points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Join segments sharing endpoints into polylines.
///
/// Returns `(points, closed)` per chain; a closed chain does not repeat its
/// first point.
fn chain_segments(segments: &[(Point3, Point3)], tolerance: f64) -> Vec<(Vec<Point3>, bool)> {
    if segments.is_empty() {
        return Vec::new();
    }

    // point key -> (segment index, matched at end)
    let mut adjacency: HashMap<PointKey, Vec<(usize, bool)>> = HashMap::new();
    for (i, (p0, p1)) in segments.iter().enumerate() {
        adjacency.entry(point_key(p0, tolerance)).or_default().push((i, false));
        adjacency.entry(point_key(p1, tolerance)).or_default().push((i, true));
    }

    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    let next_from = |current: &Point3, used: &mut [bool]| -> Option<Point3> {
        let neighbors = adjacency.get(&point_key(current, tolerance))?;
        let &(seg, is_end) = neighbors.iter().find(|(seg, _)| !used[*seg])?;
        used[seg] = true;
        let (s0, s1) = segments[seg];
        Some(if is_end { s0 } else { s1 })
    };

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (p0, p1) = segments[start];
        let mut forward = vec![p0, p1];

        let mut current = p1;
        while let Some(next) = next_from(&current, &mut used) {
            forward.push(next);
            current = next;
        }

        let mut backward = Vec::new();
        let mut current = p0;
        while let Some(prev) = next_from(&current, &mut used) {
            backward.push(prev);
            current = prev;
        }

        backward.reverse();
        backward.extend(forward);
        let mut chain = backward;

        let closed = chain.len() >= 4
            && point_key(&chain[0], tolerance) == point_key(&chain[chain.len() - 1], tolerance);
        if closed {
            chain.pop();
        }
        chains.push((chain, closed));
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use archdraw_model::ElementMesh;

    fn cube(h: f64) -> (Vec<Point3>, Vec<Vec<u32>>) {
        let mesh = ElementMesh::cuboid([-h, -h, -h], [h, h, h]);
        (mesh.points(), mesh.faces)
    }

    fn slicer(origin: Point3, normal: Vec3) -> PlaneSlicer {
        PlaneSlicer::new(&SectionPlane::with_default_up(origin, normal)).unwrap()
    }

    #[test]
    fn test_classify() {
        let s = slicer(Point3::origin(), Vec3::z());
        assert_eq!(s.classify(&Point3::new(0.0, 0.0, 1.0)), Side::Front);
        assert_eq!(s.classify(&Point3::new(0.0, 0.0, -1.0)), Side::Back);
        assert_eq!(s.classify(&Point3::new(5.0, 5.0, 1e-12)), Side::On);
        let pts = vec![Point3::new(0.3, 0.1, 0.2), Point3::new(0.0, 0.0, -0.7)];
        assert_eq!(s.classify_all(&pts), s.classify_all(&pts));
    }

    #[test]
    fn test_invalid_plane() {
        let plane = SectionPlane::with_default_up(Point3::origin(), Vec3::zeros());
        assert!(PlaneSlicer::new(&plane).is_err());
    }

    #[test]
    fn test_crossing_triangle_clipped() {
        let s = slicer(Point3::origin(), Vec3::z());
        let tri = [
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.0, 2.0, 1.0),
        ];
        let slice = s.slice_face(&tri);
        assert_eq!(slice.case, SliceCase::Crossing);
        let kept = slice.kept.unwrap();
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|p| p.z >= -1e-12));
        assert_eq!(slice.cut_edges.len(), 1);
        let (a, b) = slice.cut_edges[0];
        assert!(a.z.abs() < 1e-12 && b.z.abs() < 1e-12);
        assert!(((a - b).norm() - 2f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_vertex_transition() {
        let s = slicer(Point3::origin(), Vec3::z());
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, -1.0),
        ];
        let slice = s.slice_face(&tri);
        assert_eq!(slice.case, SliceCase::VertexTransition);
        assert_eq!(slice.transition_edges.len(), 2);
        assert_eq!(slice.cut_edges.len(), 1);
        assert!((slice.cut_edges[0].1 - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12
            || (slice.cut_edges[0].0 - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_edge_on_plane() {
        let s = slicer(Point3::origin(), Vec3::z());
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 0.0, -1.0),
        ];
        let slice = s.slice_face(&tri);
        assert_eq!(slice.case, SliceCase::EdgeOnPlane);
        assert!(slice.kept.is_none());
        assert_eq!(slice.cut_edges.len(), 1);
    }

    #[test]
    fn test_coplanar_face() {
        let s = slicer(Point3::origin(), Vec3::z());
        let quad = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(s.slice_face(&quad).case, SliceCase::Coplanar);
        assert_eq!(s.slice_face(&quad[..2]).case, SliceCase::Degenerate);
    }

    #[test]
    fn test_cube_cut_square() {
        let (vertices, faces) = cube(0.5);
        let s = slicer(Point3::origin(), Vec3::z());
        let result = s.slice_mesh(&vertices, &faces);
        assert_eq!(result.cut_edges.len(), 4);
        let loops = s.compute_cut_polygon(&result);
        assert_eq!(loops.len(), 1);
        assert!(loops[0].closed);
        assert!((loops[0].area - 1.0).abs() < 1e-10);
        // Bottom face dropped, top kept whole, four sides clipped.
        assert_eq!(result.kept_faces.len(), 5);
    }

    #[test]
    fn test_plane_through_top_face() {
        let (vertices, faces) = cube(0.5);
        let s = slicer(Point3::new(0.0, 0.0, 0.5), Vec3::new(0.0, 0.0, -1.0));
        let result = s.slice_mesh(&vertices, &faces);
        assert_eq!(result.cut_faces.len(), 1);
        assert_eq!(result.count(Side::On), 4);
        let loops = s.compute_cut_polygon(&result);
        assert_eq!(loops.len(), 1);
        assert!((loops[0].area - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_courtyard_is_separate_hole() {
        // Square ring: outer 0..4, inner 1..3, built from two prisms' walls.
        let outer = ElementMesh::extruded(
            &[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
            0.0,
            3.0,
        );
        let inner = ElementMesh::extruded(
            &[[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]],
            0.0,
            3.0,
        );
        let s = PlaneSlicer::new(&SectionPlane::horizontal(1.5)).unwrap();
        let mut result = s.slice_mesh(&outer.points(), &outer.faces);
        let inner_result = s.slice_mesh(&inner.points(), &inner.faces);
        result.cut_edges.extend(inner_result.cut_edges);

        let loops = s.compute_cut_polygon(&result);
        assert_eq!(loops.len(), 2);
        let holes: Vec<_> = loops.iter().filter(|l| l.is_hole).collect();
        assert_eq!(holes.len(), 1);
        assert!((holes[0].area + 4.0).abs() < 1e-10);
        let outer_loop = loops.iter().find(|l| !l.is_hole).unwrap();
        assert!((outer_loop.area - 16.0).abs() < 1e-10);
    }

    #[test]
    fn test_side_by_side_prisms_stay_separate() {
        // One mesh holding two piers 1 m apart.
        let left = ElementMesh::cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 3.0]);
        let right = ElementMesh::cuboid([2.0, 0.0, 0.0], [3.0, 1.0, 3.0]);
        let mut points = left.points();
        let offset = points.len() as u32;
        points.extend(right.points());
        let mut faces = left.faces.clone();
        faces.extend(
            right
                .faces
                .iter()
                .map(|f| f.iter().map(|i| i + offset).collect::<Vec<u32>>()),
        );

        let s = PlaneSlicer::new(&SectionPlane::horizontal(1.5)).unwrap();
        let loops = s.compute_cut_polygon(&s.slice_mesh(&points, &faces));
        assert_eq!(loops.len(), 2);
        for l in &loops {
            assert!(l.closed);
            assert!(!l.is_hole);
            assert!((l.area - 1.0).abs() < 1e-10);
        }
        let mut min_x: Vec<f64> = loops
            .iter()
            .map(|l| l.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min))
            .collect();
        min_x.sort_by(f64::total_cmp);
        assert!((min_x[0] - 0.0).abs() < 1e-10);
        assert!((min_x[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_open_chain_reported() {
        let s = slicer(Point3::origin(), Vec3::z());
        let result = SliceResult {
            cut_edges: vec![
                (Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
                (Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)),
            ],
            ..SliceResult::default()
        };
        let loops = s.compute_cut_polygon(&result);
        assert_eq!(loops.len(), 1);
        assert!(!loops[0].closed);
        assert_eq!(loops[0].points.len(), 3);
    }

    #[test]
    fn test_horizontal_plane_frame_matches_world() {
        let s = PlaneSlicer::new(&SectionPlane::horizontal(2.0)).unwrap();
        let p = s.to_plane_2d(&Point3::new(3.0, -4.0, 2.0));
        assert!((p.x - 3.0).abs() < 1e-12);
        assert!((p.y + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_nonconvex_face_two_segments() {
        // U-shaped face in the XZ plane crossing z = 0 twice.
        let s = slicer(Point3::origin(), Vec3::z());
        let face = [
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(3.0, 0.0, -1.0),
            Point3::new(3.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, -0.5),
            Point3::new(1.0, 0.0, -0.5),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let slice = s.slice_face(&face);
        assert_eq!(slice.cut_edges.len(), 2);
        let total: f64 = slice.cut_edges.iter().map(|(a, b)| (a - b).norm()).sum();
        assert!((total - 2.0).abs() < 1e-10);
    }
}
