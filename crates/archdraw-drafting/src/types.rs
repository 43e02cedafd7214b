//! Core types for 2D architectural drawing generation.

use archdraw_math::{centroid, from_array, try_normalize, Point3, Vec3};
use archdraw_model::ElementId;
use serde::{Deserialize, Serialize};

use crate::error::{DraftingError, Result};
use crate::hatch::HatchKind;

/// A 2D point in drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point2D {
    /// Create a new 2D point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0).
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::new(
            self.x + t * (other.x - self.x),
            self.y + t * (other.y - self.y),
        )
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// A straight 2D line segment (hatch strokes, grid lines).
pub type Segment2D = (Point2D, Point2D);

/// 2D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl BoundingBox2D {
    /// Create a box from explicit extents.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create an empty bounding box (inverted, ready for accumulation).
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// The `(0, 0, 0, 0)` box reported for empty results.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Bounds of a point set, `(0, 0, 0, 0)` when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.include_point(*p);
        }
        bb.or_zero()
    }

    /// Expand the bounding box to include a point.
    pub fn include_point(&mut self, p: Point2D) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Expand to include another (valid) box.
    pub fn include_box(&mut self, other: &BoundingBox2D) {
        if other.is_valid() {
            self.include_point(Point2D::new(other.min_x, other.min_y));
            self.include_point(Point2D::new(other.max_x, other.max_y));
        }
    }

    /// Replace an empty (inverted) box by the zero box.
    pub fn or_zero(self) -> Self {
        if self.is_valid() {
            self
        } else {
            Self::zero()
        }
    }

    /// Grow the box by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    /// True if `p` lies inside or on the box.
    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if the bounding box is valid (non-empty).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}

impl Default for BoundingBox2D {
    fn default() -> Self {
        Self::empty()
    }
}

/// Drafting line style of a projected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    /// Continuous line for visible geometry.
    Solid,
    /// Dashed line for geometry behind visible faces.
    Hidden,
}

/// Classification of a projected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceClass {
    /// Front-facing and pointing away from the building interior.
    Exterior,
    /// Lies in a cutting plane.
    Cut,
    /// Back-facing or pointing towards the interior.
    Interior,
}

/// A projected vertex: drawing position plus depth along the view direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedVertex {
    /// Position in 2D view coordinates.
    pub position: Point2D,
    /// Signed distance along the view direction (larger is nearer the viewer).
    pub depth: f64,
    /// True if the vertex belongs to at least one visible face.
    pub visible: bool,
}

/// A 2D projected edge with visibility information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    /// Start vertex.
    pub start: ProjectedVertex,
    /// End vertex.
    pub end: ProjectedVertex,
    /// Visibility classification.
    pub visible: bool,
    /// Line style for rendering.
    pub style: LineStyle,
}

impl ProjectedEdge {
    /// Length of the edge in 2D.
    pub fn length(&self) -> f64 {
        self.start.position.distance(&self.end.position)
    }
}

/// A projected polygonal face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedFace {
    /// Indices into the owning mesh's projected vertices, in loop order.
    pub vertices: Vec<usize>,
    /// Unit normal `[x, y, z]` in model space.
    pub normal: [f64; 3],
    /// Centroid `[x, y, z]` in model space.
    pub centroid: [f64; 3],
    /// Front-facing relative to the view direction.
    pub visible: bool,
    /// Exterior / cut / interior classification.
    pub class: FaceClass,
    /// Hatch assigned to the face, if any.
    pub hatch: Option<HatchKind>,
    /// False when the normal is a default substituted for degenerate geometry.
    pub reliable: bool,
}

/// Unit face normal with a reliability marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceNormal {
    /// Unit normal, `+Z` when unreliable.
    pub normal: Vec3,
    /// False for faces with fewer than three vertices or collinear leading points.
    pub reliable: bool,
}

impl FaceNormal {
    /// Normal substituted for degenerate faces.
    pub const DEFAULT: Vec3 = Vec3::new(0.0, 0.0, 1.0);
}

/// Compute a face normal from the cross product of its first two edges.
pub fn compute_face_normal(points: &[Point3]) -> FaceNormal {
    let unreliable = FaceNormal {
        normal: FaceNormal::DEFAULT,
        reliable: false,
    };
    if points.len() < 3 {
        return unreliable;
    }
    let e1 = points[1] - points[0];
    let e2 = points[2] - points[1];
    match try_normalize(&e1.cross(&e2)) {
        Some(normal) => FaceNormal {
            normal,
            reliable: true,
        },
        None => unreliable,
    }
}

/// A polygonal face in model space with its derived normal and centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct Face3D {
    /// Vertex loop.
    pub points: Vec<Point3>,
    /// Unit normal (default `+Z` when unreliable).
    pub normal: Vec3,
    /// Centroid of the vertex loop.
    pub centroid: Point3,
    /// False when the normal could not be derived.
    pub reliable: bool,
}

impl Face3D {
    /// Build a face and compute its normal and centroid.
    pub fn new(points: Vec<Point3>) -> Self {
        let FaceNormal { normal, reliable } = compute_face_normal(&points);
        let centroid = centroid(&points).unwrap_or_else(Point3::origin);
        Self {
            points,
            normal,
            centroid,
            reliable,
        }
    }

    /// Gather a face from an index loop; `None` if an index is out of range.
    pub fn from_indices(vertices: &[Point3], loop_indices: &[u32]) -> Option<Self> {
        let points = loop_indices
            .iter()
            .map(|&i| vertices.get(i as usize).copied())
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(points))
    }
}

/// Defines a cutting plane for section and plan views.
///
/// Material on the `normal` side is kept; the viewer stands on the opposite
/// side looking along `normal`. Uses array representation for serialization
/// compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPlane {
    /// Point on the cutting plane [x, y, z].
    pub origin: [f64; 3],
    /// Plane normal pointing into the kept half-space [x, y, z].
    pub normal: [f64; 3],
    /// Up direction for 2D projection orientation [x, y, z].
    pub up: [f64; 3],
}

impl SectionPlane {
    /// Create a new section plane.
    pub fn new(origin: Point3, normal: Vec3, up: Vec3) -> Self {
        Self {
            origin: [origin.x, origin.y, origin.z],
            normal: [normal.x, normal.y, normal.z],
            up: [up.x, up.y, up.z],
        }
    }

    /// Create a plane with world `+Z` as up (substituted later if parallel to the normal).
    pub fn with_default_up(origin: Point3, normal: Vec3) -> Self {
        Self::new(origin, normal, Vec3::z())
    }

    /// Horizontal plan cut at height `z`, keeping everything below.
    pub fn horizontal(z: f64) -> Self {
        Self {
            origin: [0.0, 0.0, z],
            normal: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
        }
    }

    /// Vertical cut through `origin`, keeping the side `normal` points to.
    pub fn vertical(origin: Point3, normal: Vec3) -> Self {
        Self::new(origin, Vec3::new(normal.x, normal.y, 0.0), Vec3::z())
    }

    /// Get origin as Point3.
    pub fn origin_point(&self) -> Point3 {
        from_array(self.origin)
    }

    /// Get normal as Vec3.
    pub fn normal_vec(&self) -> Vec3 {
        Vec3::new(self.normal[0], self.normal[1], self.normal[2])
    }

    /// Get up as Vec3.
    pub fn up_vec(&self) -> Vec3 {
        Vec3::new(self.up[0], self.up[1], self.up[2])
    }

    /// Reject non-finite coordinates and zero-length normals.
    pub fn validate(&self) -> Result<()> {
        let finite = self
            .origin
            .iter()
            .chain(&self.normal)
            .chain(&self.up)
            .all(|v| v.is_finite());
        if !finite {
            return Err(DraftingError::InvalidSectionPlane(
                "coordinates must be finite".into(),
            ));
        }
        if try_normalize(&self.normal_vec()).is_none() {
            return Err(DraftingError::InvalidSectionPlane(
                "normal must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// A hatched region where a cutting plane passes through solid material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSurface {
    /// Element the surface was cut from.
    pub element: Option<ElementId>,
    /// Outer boundary, counter-clockwise.
    pub polygon: Vec<Point2D>,
    /// Holes inside the boundary, clockwise.
    pub holes: Vec<Vec<Point2D>>,
    /// Material identifier of the source element.
    pub material: Option<String>,
    /// Hatch pattern.
    pub hatch: HatchKind,
    /// Hatch spacing multiplier.
    pub hatch_scale: f64,
    /// Hatch rotation in degrees.
    pub hatch_angle: f64,
    /// Hatch strokes clipped to the region.
    pub hatch_lines: Vec<Segment2D>,
}

/// Door or window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningKind {
    /// Door.
    Door,
    /// Window.
    Window,
}

/// A door or window carved from its host wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    /// Door/window element.
    pub element: ElementId,
    /// Hosting wall, if known.
    pub host: Option<ElementId>,
    /// Door or window.
    pub kind: OpeningKind,
    /// Outline in view coordinates.
    pub polygon: Vec<Point2D>,
    /// Clear width.
    pub width: f64,
    /// Clear height.
    pub height: f64,
    /// Sill height above the host base.
    pub sill_height: f64,
}

/// What a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Unknown material hatched with the default diagonal pattern.
    MaterialFallback,
    /// Unrecognized direction replaced by the canonical default.
    DirectionFallback,
    /// Up vector parallel to the view direction was replaced.
    UpVectorSubstituted,
    /// Face with fewer than three vertices or no derivable normal.
    DegenerateFace,
    /// Element with no usable geometry.
    EmptyGeometry,
    /// Cut edges that did not close into a loop.
    OpenCutLoop,
}

/// A non-fatal condition recorded while generating a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Element concerned, if any.
    pub element: Option<ElementId>,
    /// Category.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic.
    pub fn new(
        kind: DiagnosticKind,
        element: Option<ElementId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            element,
            kind,
            message: message.into(),
        }
    }
}
