//! Plan views: a horizontal cut looking down.

use archdraw_math::{Point3, EPSILON};
use archdraw_model::{Element, ElementId, ElementKind, ModelProvider};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    check_geometry, project_annotation, project_element, union_bounds, Annotation2D, CutContext,
    DimensionLine, DrawingSettings, ElementGroups, ElementOutline,
};
use crate::error::{DraftingError, Result};
use crate::projection::{ProjectedMesh, ProjectionAnchor, Projector};
use crate::slicer::{signed_area, CutLoop, PlaneSlicer};
use crate::types::{
    BoundingBox2D, CutSurface, Diagnostic, Opening, OpeningKind, Point2D, SectionPlane,
};

/// Parameters of one plan view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    /// Height of the horizontal cut.
    pub cut_level: f64,
    /// How far below the cut geometry is still drawn.
    pub view_depth: f64,
    /// Draw furniture below the cut.
    pub include_furniture: bool,
    /// Drafting conventions.
    pub settings: DrawingSettings,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            cut_level: 1.2,
            view_depth: 1.5,
            include_furniture: true,
            settings: DrawingSettings::default(),
        }
    }
}

impl PlanRequest {
    /// Request with default settings at `cut_level`.
    pub fn at_level(cut_level: f64) -> Self {
        Self {
            cut_level,
            ..Self::default()
        }
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<()> {
        if !self.cut_level.is_finite() {
            return Err(DraftingError::InvalidRequest("cut level must be finite".into()));
        }
        if !(self.view_depth.is_finite() && self.view_depth >= 0.0) {
            return Err(DraftingError::InvalidRequest(
                "view depth must be non-negative".into(),
            ));
        }
        self.settings.validate()
    }
}

/// Room name and area placed at the room's centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLabel {
    /// Room element.
    pub element: ElementId,
    /// Room name.
    pub name: Option<String>,
    /// Label position (area centroid of the outline).
    pub position: Point2D,
    /// Floor area at the cut level.
    pub area: f64,
    /// Room outline, counter-clockwise.
    pub polygon: Vec<Point2D>,
}

/// A generated plan view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanView {
    /// Height of the cut.
    pub cut_level: f64,
    /// Drawing scale denominator.
    pub scale: f64,
    /// Hatched regions where the cut passes through structure.
    pub cut_surfaces: Vec<CutSurface>,
    /// Doors and windows at the cut level.
    pub openings: Vec<Opening>,
    /// Geometry below the cut, seen from above.
    pub projection: ProjectedMesh,
    /// Furniture and other outlines below the cut.
    pub outlines: Vec<ElementOutline>,
    /// Room labels.
    pub rooms: Vec<RoomLabel>,
    /// Drawn elements by category.
    pub elements: ElementGroups,
    /// Room dimensions.
    pub dimensions: Vec<DimensionLine>,
    /// Annotations between the cut and the view depth.
    pub annotations: Vec<Annotation2D>,
    /// Bounds of everything drawn; `(0, 0, 0, 0)` when empty.
    pub bounds: BoundingBox2D,
    /// Non-fatal conditions.
    pub diagnostics: Vec<Diagnostic>,
}

/// Generates plan views.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanViewGenerator;

impl PlanViewGenerator {
    /// Generate a plan view at `request.cut_level`.
    pub fn generate<M: ModelProvider + ?Sized>(
        &self,
        model: &M,
        request: &PlanRequest,
    ) -> Result<PlanView> {
        request.validate()?;
        let cut = request.cut_level;
        let floor = cut - request.view_depth;

        let plane = SectionPlane::horizontal(cut);
        let slicer = PlaneSlicer::new(&plane)?;
        let projector =
            Projector::from_basis(*slicer.basis(), true).with_anchor(ProjectionAnchor::WorldOrigin);
        let library = request.settings.hatch.library();
        let ctx = CutContext {
            model,
            slicer: &slicer,
            library: &library,
            hatch: &request.settings.hatch,
        };

        let mut view = PlanView {
            cut_level: cut,
            scale: request.settings.scale,
            cut_surfaces: Vec::new(),
            openings: Vec::new(),
            projection: ProjectedMesh::new(projector.basis().view_direction),
            outlines: Vec::new(),
            rooms: Vec::new(),
            elements: ElementGroups::default(),
            dimensions: Vec::new(),
            annotations: Vec::new(),
            bounds: BoundingBox2D::zero(),
            diagnostics: Vec::new(),
        };

        for element in model.elements() {
            if !check_geometry(element, &mut view.diagnostics) {
                continue;
            }
            let range = element.elevation;
            let is_cut = range.contains(cut);
            let below = range.overlaps(floor, cut);

            match element.kind {
                ElementKind::Wall
                | ElementKind::Column
                | ElementKind::Floor
                | ElementKind::Beam
                | ElementKind::Roof => {
                    if is_cut {
                        let (surfaces, _) = ctx.cut_element(element, &mut view.diagnostics);
                        if !surfaces.is_empty() {
                            view.elements.push(element.kind, element.id);
                            view.cut_surfaces.extend(surfaces);
                            continue;
                        }
                    }
                    if below {
                        self.project_below(&projector, element, &mut view);
                    }
                }
                ElementKind::Door | ElementKind::Window => {
                    if is_cut {
                        let loops = ctx.cut_loops(element, &mut view.diagnostics);
                        view.elements.push(element.kind, element.id);
                        view.openings.push(plan_opening(model, element, &loops, &projector));
                    } else if below {
                        self.project_below(&projector, element, &mut view);
                    }
                }
                ElementKind::Furniture => {
                    if request.include_furniture && below {
                        self.project_below(&projector, element, &mut view);
                    }
                }
                ElementKind::Room => {
                    if is_cut {
                        let loops = ctx.cut_loops(element, &mut view.diagnostics);
                        if let Some(outline) = loops.into_iter().find(|l| !l.is_hole) {
                            view.elements.push(element.kind, element.id);
                            let offset = request.settings.dimension_offset;
                            view.dimensions
                                .extend(room_dimensions(&outline.points, offset));
                            view.rooms.push(RoomLabel {
                                element: element.id,
                                name: element.name.clone(),
                                position: area_centroid(&outline.points),
                                area: outline.area,
                                polygon: outline.points,
                            });
                        }
                    }
                }
            }
        }

        exclude_hosted_openings(&mut view.cut_surfaces, &view.openings);

        let reference = Point3::origin();
        for annotation in model.annotations() {
            let z = annotation.position[2];
            if z > cut + EPSILON || z < floor - EPSILON {
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
            (!view.projection.is_empty()).then_some(view.projection.bounds),
            view.cut_surfaces
                .iter()
                .flat_map(|s| s.polygon.iter())
                .chain(view.openings.iter().flat_map(|o| o.polygon.iter()))
                .chain(view.rooms.iter().flat_map(|r| r.polygon.iter())),
        );

        tracing::debug!(
            cut_level = cut,
            cut_surfaces = view.cut_surfaces.len(),
            openings = view.openings.len(),
            rooms = view.rooms.len(),
            "generated plan view"
        );
        Ok(view)
    }

    /// Generate a plan view at `cut_level` with default settings.
    pub fn generate_at<M: ModelProvider + ?Sized>(
        &self,
        model: &M,
        cut_level: f64,
    ) -> Result<PlanView> {
        self.generate(model, &PlanRequest::at_level(cut_level))
    }

    /// One independent plan per level, in the order given.
    ///
    /// Levels are generated in parallel; `base` supplies every other
    /// parameter.
    pub fn generate_multi_level<M: ModelProvider + ?Sized>(
        &self,
        model: &M,
        levels: &[f64],
        base: &PlanRequest,
    ) -> Result<Vec<PlanView>> {
        base.validate()?;
        levels
            .par_iter()
            .map(|&cut_level| {
                let request = PlanRequest {
                    cut_level,
                    ..base.clone()
                };
                self.generate(model, &request)
            })
            .collect()
    }

    fn project_below(&self, projector: &Projector, element: &Element, view: &mut PlanView) {
        let (mesh, outline) =
            project_element(projector, element, &element.mesh.faces, &mut view.diagnostics);
        if mesh.is_empty() {
            return;
        }
        view.elements.push(element.kind, element.id);
        view.projection.merge(mesh);
        view.outlines.push(outline);
    }
}

/// Re-hatch host surfaces so strokes stop at the doors and windows they carry.
///
/// The opening polygons only act as extra hatch exclusions; the surface
/// outline and its holes are left as cut.
fn exclude_hosted_openings(surfaces: &mut [CutSurface], openings: &[Opening]) {
    for surface in surfaces {
        let Some(id) = surface.element else {
            continue;
        };
        let hosted: Vec<Vec<Point2D>> = openings
            .iter()
            .filter(|o| o.host == Some(id) && o.polygon.len() >= 3)
            .map(|o| o.polygon.clone())
            .collect();
        if hosted.is_empty() {
            continue;
        }
        let mut rings = surface.holes.clone();
        rings.extend(hosted);
        surface.hatch_lines = surface.hatch.fill_polygon(
            &surface.polygon,
            &rings,
            surface.hatch_scale,
            surface.hatch_angle,
        );
    }
}

/// Build the plan symbol of a door or window cut by the plan plane.
fn plan_opening<M: ModelProvider + ?Sized>(
    model: &M,
    element: &Element,
    loops: &[CutLoop],
    projector: &Projector,
) -> Opening {
    let polygon = match loops.iter().find(|l| !l.is_hole) {
        Some(outer) => outer.points.clone(),
        None => {
            // No closed section: fall back to the footprint rectangle.
            let projected = projector.project(&element.world_vertices());
            let b = BoundingBox2D::from_points(&projected);
            vec![
                Point2D::new(b.min_x, b.min_y),
                Point2D::new(b.max_x, b.min_y),
                Point2D::new(b.max_x, b.max_y),
                Point2D::new(b.min_x, b.max_y),
            ]
        }
    };

    let kind = match element.kind {
        ElementKind::Door => OpeningKind::Door,
        _ => OpeningKind::Window,
    };
    let (width, height, sill_height) = match element.opening {
        Some(p) => (p.width, p.height, p.sill_height),
        None => {
            let b = BoundingBox2D::from_points(&polygon);
            let host_base = element
                .host
                .and_then(|id| model.element(id))
                .map_or(element.elevation.base, |host| host.elevation.base);
            (
                b.width().max(b.height()),
                element.elevation.height(),
                element.elevation.base - host_base,
            )
        }
    };

    Opening {
        element: element.id,
        host: element.host,
        kind,
        polygon,
        width,
        height,
        sill_height,
    }
}

/// Overall width and depth of a room outline, offset below and left of it.
fn room_dimensions(polygon: &[Point2D], offset: f64) -> Vec<DimensionLine> {
    let b = BoundingBox2D::from_points(polygon);
    if b.width() <= EPSILON || b.height() <= EPSILON {
        return Vec::new();
    }
    vec![
        DimensionLine::new(
            Point2D::new(b.min_x, b.min_y - offset),
            Point2D::new(b.max_x, b.min_y - offset),
        ),
        DimensionLine::new(
            Point2D::new(b.min_x - offset, b.min_y),
            Point2D::new(b.min_x - offset, b.max_y),
        ),
    ]
}

/// Area centroid of a simple polygon; vertex mean when the area vanishes.
fn area_centroid(polygon: &[Point2D]) -> Point2D {
    let area = signed_area(polygon);
    let n = polygon.len();
    if area.abs() <= EPSILON {
        let (sx, sy) = polygon
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Point2D::new(sx / n.max(1) as f64, sy / n.max(1) as f64);
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (a, b) = (&polygon[i], &polygon[(i + 1) % n]);
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Point2D::new(cx / (6.0 * area), cy / (6.0 * area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hatch::HatchKind;
    use archdraw_model::{BuildingModel, ElementMesh, MaterialDef, OpeningParams};

    fn sample_model() -> BuildingModel {
        let mut model = BuildingModel::new();
        model.push(
            Element::new(
                1,
                ElementKind::Wall,
                ElementMesh::cuboid([0.0, 0.0, 0.0], [5.0, 0.2, 3.0]),
            )
            .with_material("c30"),
        );
        model.push(
            Element::new(
                2,
                ElementKind::Door,
                ElementMesh::cuboid([1.0, 0.0, 0.0], [1.9, 0.2, 2.1]),
            )
            .with_host(1),
        );
        model.push(
            Element::new(
                3,
                ElementKind::Window,
                ElementMesh::cuboid([3.0, 0.0, 0.9], [4.2, 0.2, 2.1]),
            )
            .with_host(1)
            .with_opening(OpeningParams {
                width: 1.2,
                height: 1.2,
                sill_height: 0.9,
            }),
        );
        model.push(Element::new(
            4,
            ElementKind::Floor,
            ElementMesh::cuboid([0.0, 0.0, -0.2], [5.0, 4.0, 0.0]),
        ));
        model.push(
            Element::new(
                5,
                ElementKind::Room,
                ElementMesh::cuboid([0.2, 0.2, 0.0], [5.0, 4.0, 2.8]),
            )
            .with_name("Living"),
        );
        model.push(Element::new(
            6,
            ElementKind::Furniture,
            ElementMesh::cuboid([2.0, 2.0, 0.0], [3.0, 3.0, 0.75]),
        ));
        model.add_material(MaterialDef {
            name: "c30".into(),
            category: Some("concrete".into()),
            color: None,
        });
        model
    }

    #[test]
    fn test_wall_cut_is_hatched() {
        let view = PlanViewGenerator.generate_at(&sample_model(), 1.2).unwrap();
        assert_eq!(view.cut_surfaces.len(), 1);
        let wall = &view.cut_surfaces[0];
        assert_eq!(wall.hatch, HatchKind::Concrete);
        assert!(!wall.hatch_lines.is_empty());
        assert!((signed_area(&wall.polygon) - 1.0).abs() < 1e-9);
        assert!(view.diagnostics.is_empty(), "{:?}", view.diagnostics);
    }

    #[test]
    fn test_wall_hatch_stops_at_openings() {
        let view = PlanViewGenerator.generate_at(&sample_model(), 1.2).unwrap();
        let wall = &view.cut_surfaces[0];
        assert!(wall.holes.is_empty());
        assert!(!wall.hatch_lines.is_empty());
        // Door spans x 1.0..1.9, window x 3.0..4.2.
        let tol = 1e-9;
        for (a, b) in &wall.hatch_lines {
            let mid = a.midpoint(b);
            assert!(!(mid.x > 1.0 + tol && mid.x < 1.9 - tol), "stroke in door at {mid:?}");
            assert!(!(mid.x > 3.0 + tol && mid.x < 4.2 - tol), "stroke in window at {mid:?}");
        }
    }

    #[test]
    fn test_openings_at_cut() {
        let view = PlanViewGenerator.generate_at(&sample_model(), 1.2).unwrap();
        assert_eq!(view.openings.len(), 2);
        let door = view.openings.iter().find(|o| o.kind == OpeningKind::Door).unwrap();
        assert_eq!(door.host, Some(1));
        assert!((door.width - 0.9).abs() < 1e-9);
        assert!((door.height - 2.1).abs() < 1e-9);
        assert!(door.sill_height.abs() < 1e-9);
        let window = view.openings.iter().find(|o| o.kind == OpeningKind::Window).unwrap();
        assert_eq!(window.sill_height, 0.9);
    }

    #[test]
    fn test_window_above_cut_is_not_an_opening() {
        let view = PlanViewGenerator.generate_at(&sample_model(), 0.5).unwrap();
        assert_eq!(view.openings.len(), 1);
        assert_eq!(view.elements.windows(), &[] as &[ElementId]);
    }

    #[test]
    fn test_room_label_and_dimensions() {
        let view = PlanViewGenerator.generate_at(&sample_model(), 1.2).unwrap();
        assert_eq!(view.rooms.len(), 1);
        let room = &view.rooms[0];
        assert_eq!(room.name.as_deref(), Some("Living"));
        assert!((room.area - 4.8 * 3.8).abs() < 1e-9);
        assert!((room.position.x - 2.6).abs() < 1e-9);
        assert!((room.position.y - 2.1).abs() < 1e-9);
        assert_eq!(view.dimensions.len(), 2);
        assert!((view.dimensions[0].value - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_below_cut_projected() {
        let view = PlanViewGenerator.generate_at(&sample_model(), 1.2).unwrap();
        // Floor slab and furniture are below the cut.
        assert_eq!(view.outlines.len(), 2);
        assert!(view.elements.ids(ElementKind::Furniture).contains(&6));
        assert!(!view.projection.is_empty());

        let request = PlanRequest {
            include_furniture: false,
            ..PlanRequest::at_level(1.2)
        };
        let view = PlanViewGenerator.generate(&sample_model(), &request).unwrap();
        assert!(view.elements.ids(ElementKind::Furniture).is_empty());
    }

    #[test]
    fn test_world_coordinates() {
        let view = PlanViewGenerator.generate_at(&sample_model(), 1.2).unwrap();
        assert!((view.bounds.min_x - 0.0).abs() < 1e-9);
        assert!((view.bounds.max_x - 5.0).abs() < 1e-9);
        assert!((view.bounds.max_y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_material_flagged() {
        let mut model = BuildingModel::new();
        model.push(
            Element::new(9, ElementKind::Column, ElementMesh::cuboid([0.0; 3], [0.3, 0.3, 3.0]))
                .with_material("mystery"),
        );
        let view = PlanViewGenerator.generate_at(&model, 1.0).unwrap();
        assert_eq!(view.cut_surfaces[0].hatch, HatchKind::Diagonal);
        assert!(view.diagnostics.iter().any(|d| {
            d.kind == crate::types::DiagnosticKind::MaterialFallback && d.element == Some(9)
        }));
    }

    #[test]
    fn test_empty_model() {
        let view = PlanViewGenerator.generate_at(&BuildingModel::new(), 1.0).unwrap();
        assert!(view.cut_surfaces.is_empty());
        assert_eq!(view.bounds, BoundingBox2D::zero());
    }

    #[test]
    fn test_invalid_request() {
        let request = PlanRequest {
            view_depth: -1.0,
            ..PlanRequest::default()
        };
        assert!(PlanViewGenerator.generate(&sample_model(), &request).is_err());
        assert!(PlanViewGenerator.generate_at(&sample_model(), f64::NAN).is_err());
    }
}
