//! Cardinal elevations: exterior faces seen from a compass direction.

use std::fmt;
use std::str::FromStr;

use archdraw_math::{Point3, Vec3, EPSILON};
use archdraw_model::{ElementKind, ModelProvider};
use serde::{Deserialize, Serialize};

use super::{
    check_geometry, project_annotation, project_element, union_bounds, Annotation2D,
    DimensionLine, DrawingSettings, ElementGroups, ElementOutline, GridLine, LevelMarker,
};
use crate::error::{DraftingError, Result};
use crate::projection::{ProjectedMesh, ProjectionAnchor, Projector};
use crate::types::{BoundingBox2D, Diagnostic, DiagnosticKind, Face3D, Point2D};
use crate::visibility::VisibilityAnalyzer;

/// Compass direction of an elevation.
///
/// The view vector points from the building towards the viewer:
/// SOUTH `(0, 1, 0)`, NORTH `(0, -1, 0)`, EAST `(1, 0, 0)`, WEST `(-1, 0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalDirection {
    /// North elevation.
    North,
    /// South elevation (default).
    #[default]
    South,
    /// East elevation.
    East,
    /// West elevation.
    West,
}

impl CardinalDirection {
    /// All four directions.
    pub const ALL: [CardinalDirection; 4] = [
        CardinalDirection::North,
        CardinalDirection::South,
        CardinalDirection::East,
        CardinalDirection::West,
    ];

    /// Unit view vector for this direction.
    pub fn view_direction(self) -> Vec3 {
        match self {
            CardinalDirection::South => Vec3::new(0.0, 1.0, 0.0),
            CardinalDirection::North => Vec3::new(0.0, -1.0, 0.0),
            CardinalDirection::East => Vec3::new(1.0, 0.0, 0.0),
            CardinalDirection::West => Vec3::new(-1.0, 0.0, 0.0),
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            CardinalDirection::North => "north",
            CardinalDirection::South => "south",
            CardinalDirection::East => "east",
            CardinalDirection::West => "west",
        }
    }

    /// Parse a direction, falling back to SOUTH for unknown input.
    ///
    /// The fallback is reported through the returned diagnostic and a
    /// warning in the log.
    pub fn parse_lenient(input: &str) -> (Self, Option<Diagnostic>) {
        match input.parse() {
            Ok(direction) => (direction, None),
            Err(_) => {
                tracing::warn!(direction = input, "unknown elevation direction, using south");
                (
                    CardinalDirection::South,
                    Some(Diagnostic::new(
                        DiagnosticKind::DirectionFallback,
                        None,
                        format!("unknown direction {input:?}, using south"),
                    )),
                )
            }
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CardinalDirection {
    type Err = DraftingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(CardinalDirection::North),
            "south" | "s" => Ok(CardinalDirection::South),
            "east" | "e" => Ok(CardinalDirection::East),
            "west" | "w" => Ok(CardinalDirection::West),
            _ => Err(DraftingError::UnknownDirection(s.to_string())),
        }
    }
}

/// Parameters of one elevation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationRequest {
    /// Which side of the building to draw.
    pub direction: CardinalDirection,
    /// Drafting conventions.
    pub settings: DrawingSettings,
}

impl ElevationRequest {
    /// Request for `direction` with default settings.
    pub fn new(direction: CardinalDirection) -> Self {
        Self {
            direction,
            settings: DrawingSettings::default(),
        }
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}

/// A generated elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationView {
    /// Compass direction.
    pub direction: CardinalDirection,
    /// View vector `[x, y, z]`.
    pub view_direction: [f64; 3],
    /// Drawing scale denominator.
    pub scale: f64,
    /// Exterior faces, projected.
    pub projection: ProjectedMesh,
    /// Visible edges per element.
    pub outlines: Vec<ElementOutline>,
    /// Retained elements by category.
    pub elements: ElementGroups,
    /// Annotations of retained elements and free annotations.
    pub annotations: Vec<Annotation2D>,
    /// Lowest retained elevation.
    pub base_elevation: f64,
    /// Highest retained elevation.
    pub top_elevation: f64,
    /// Offset used by the composition helpers.
    pub dimension_offset: f64,
    /// Bounds of the outlines; `(0, 0, 0, 0)` when empty.
    pub bounds: BoundingBox2D,
    /// Non-fatal conditions.
    pub diagnostics: Vec<Diagnostic>,
}

/// Most dimensions or grid lines a composition helper will emit.
pub const MAX_HELPER_LINES: usize = 10_000;

impl ElevationView {
    /// Stacked vertical dimensions of `floor_height` from base to top.
    ///
    /// The last dimension is shortened to end at the top.
    pub fn height_dimensions(&self, floor_height: f64) -> Vec<DimensionLine> {
        if !(floor_height.is_finite() && floor_height > 0.0) || self.is_empty() {
            return Vec::new();
        }
        let span = self.top_elevation - self.base_elevation;
        if span <= EPSILON {
            return Vec::new();
        }
        let count = ((span - EPSILON) / floor_height).ceil();
        if count > MAX_HELPER_LINES as f64 {
            tracing::warn!(floor_height, count, "too many height dimensions, skipping");
            return Vec::new();
        }
        let x = self.bounds.max_x + self.dimension_offset;
        (0..count as usize)
            .map(|i| {
                let z = self.base_elevation + i as f64 * floor_height;
                let next = (z + floor_height).min(self.top_elevation);
                DimensionLine::new(Point2D::new(x, z), Point2D::new(x, next))
            })
            .collect()
    }

    /// Markers for named levels, beside the right edge of the drawing.
    pub fn level_markers(&self, levels: &[(String, f64)]) -> Vec<LevelMarker> {
        let x = self.bounds.max_x + 2.0 * self.dimension_offset;
        levels
            .iter()
            .map(|(name, elevation)| LevelMarker {
                name: name.clone(),
                elevation: *elevation,
                position: Point2D::new(x, *elevation),
            })
            .collect()
    }

    /// Horizontal grid lines every `spacing` across the drawing height.
    pub fn grid_lines(&self, spacing: f64) -> Vec<GridLine> {
        if !(spacing.is_finite() && spacing > 0.0) || self.is_empty() {
            return Vec::new();
        }
        let x0 = self.bounds.min_x - self.dimension_offset;
        let x1 = self.bounds.max_x + self.dimension_offset;
        let first = (self.bounds.min_y / spacing).ceil() as i64;
        let last = (self.bounds.max_y / spacing).floor() as i64;
        if last.saturating_sub(first) >= MAX_HELPER_LINES as i64 {
            tracing::warn!(spacing, "too many grid lines, skipping");
            return Vec::new();
        }
        (first..=last)
            .map(|k| {
                let y = k as f64 * spacing;
                GridLine {
                    start: Point2D::new(x0, y),
                    end: Point2D::new(x1, y),
                    label: format!("{y:+.2}"),
                }
            })
            .collect()
    }

    /// True if nothing was retained.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Generates cardinal elevations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElevationViewGenerator;

impl ElevationViewGenerator {
    /// Generate an elevation.
    ///
    /// Only faces that face the viewer and point away from the model's
    /// volumetric center are drawn; elements with no such face are omitted.
    pub fn generate<M: ModelProvider + ?Sized>(
        &self,
        model: &M,
        request: &ElevationRequest,
    ) -> Result<ElevationView> {
        request.validate()?;
        let view_direction = request.direction.view_direction();
        let projector = Projector::new(view_direction, Vec3::z(), true)?
            .with_anchor(ProjectionAnchor::WorldOrigin);

        let mut view = ElevationView {
            direction: request.direction,
            view_direction: [view_direction.x, view_direction.y, view_direction.z],
            scale: request.settings.scale,
            projection: ProjectedMesh::new(view_direction),
            outlines: Vec::new(),
            elements: ElementGroups::default(),
            annotations: Vec::new(),
            base_elevation: 0.0,
            top_elevation: 0.0,
            dimension_offset: request.settings.dimension_offset,
            bounds: BoundingBox2D::zero(),
            diagnostics: Vec::new(),
        };

        let Some(center) = model.volumetric_center() else {
            return Ok(view);
        };
        let analyzer = VisibilityAnalyzer::new(view_direction)?.with_interior_point(center);

        let mut range: Option<(f64, f64)> = None;
        for element in model.elements() {
            if element.kind == ElementKind::Room
                || !check_geometry(element, &mut view.diagnostics)
            {
                continue;
            }
            let vertices = element.world_vertices();
            let faces: Vec<Vec<u32>> = element
                .mesh
                .faces
                .iter()
                .filter(|f| {
                    Face3D::from_indices(&vertices, f)
                        .is_some_and(|face| analyzer.is_exterior(&face))
                })
                .cloned()
                .collect();
            if faces.is_empty() {
                continue;
            }

            let (mesh, outline) =
                project_element(&projector, element, &faces, &mut view.diagnostics);
            view.projection.merge(mesh);
            view.outlines.push(outline);
            view.elements.push(element.kind, element.id);
            let (lo, hi) = (element.elevation.base, element.elevation.top);
            range = Some(range.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
        }
        if let Some((lo, hi)) = range {
            view.base_elevation = lo;
            view.top_elevation = hi;
        }

        let reference = Point3::origin();
        for annotation in model.annotations() {
            let keep = annotation
                .element
                .map_or(true, |id| view.elements.0.values().any(|ids| ids.contains(&id)));
            if !keep {
                continue;
            }
            let (position, depth) = project_annotation(&projector, &reference, annotation.position);
            view.annotations.push(Annotation2D {
                text: annotation.text.clone(),
                position,
                depth,
                element: annotation.element,
            });
        }

        view.bounds = union_bounds(
            view.outlines
                .iter()
                .flat_map(|o| o.edges.iter())
                .map(|e| BoundingBox2D::from_points([&e.start.position, &e.end.position])),
            std::iter::empty::<&Point2D>(),
        );

        tracing::debug!(
            direction = %request.direction,
            elements = view.elements.len(),
            "generated elevation view"
        );
        Ok(view)
    }

    /// Generate an elevation from a direction name.
    ///
    /// Unknown names fall back to SOUTH; the fallback is recorded in the
    /// view's diagnostics.
    pub fn generate_for<M: ModelProvider + ?Sized>(
        &self,
        model: &M,
        direction: &str,
    ) -> Result<ElevationView> {
        let (direction, fallback) = CardinalDirection::parse_lenient(direction);
        let mut view = self.generate(model, &ElevationRequest::new(direction))?;
        view.diagnostics.extend(fallback);
        Ok(view)
    }
}
