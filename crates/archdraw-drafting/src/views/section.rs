//! Section views through an arbitrary plane.

use archdraw_math::{from_array, Point3, EPSILON};
use archdraw_model::{ElementKind, ModelProvider};
use serde::{Deserialize, Serialize};

use super::{
    check_geometry, flag_material_fallback, project_annotation, project_polygons, union_bounds,
    Annotation2D, CutContext, DimensionLine, DrawingSettings, ElementGroups,
};
use crate::error::{DraftingError, Result};
use crate::hatch::HatchKind;
use crate::projection::{ProjectedMesh, ProjectionAnchor, Projector};
use crate::slicer::{PlaneSlicer, Side};
use crate::types::{
    BoundingBox2D, CutSurface, Diagnostic, DiagnosticKind, FaceClass, Opening, OpeningKind,
    Point2D, SectionPlane,
};

/// Parameters of one section view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionRequest {
    /// Cutting plane; required.
    pub plane: Option<SectionPlane>,
    /// Limit on how far beyond the plane geometry is drawn.
    pub view_depth: Option<f64>,
    /// Drafting conventions.
    pub settings: DrawingSettings,
}

impl SectionRequest {
    /// Request for `plane` with default settings.
    pub fn new(plane: SectionPlane) -> Self {
        Self {
            plane: Some(plane),
            ..Self::default()
        }
    }

    /// Validate the request and return its plane.
    pub fn validate(&self) -> Result<&SectionPlane> {
        let plane = self.plane.as_ref().ok_or(DraftingError::MissingSectionPlane)?;
        plane.validate()?;
        if let Some(depth) = self.view_depth {
            if !(depth.is_finite() && depth >= 0.0) {
                return Err(DraftingError::InvalidRequest(
                    "view depth must be non-negative".into(),
                ));
            }
        }
        self.settings.validate()?;
        Ok(plane)
    }
}

/// A generated section view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionView {
    /// The cutting plane.
    pub plane: SectionPlane,
    /// Drawing scale denominator.
    pub scale: f64,
    /// Hatched regions in the plane.
    pub cut_surfaces: Vec<CutSurface>,
    /// Doors and windows cut by the plane.
    pub openings: Vec<Opening>,
    /// Geometry beyond the plane.
    pub projection: ProjectedMesh,
    /// Drawn elements by category.
    pub elements: ElementGroups,
    /// Dimension lines between consecutive elevations.
    pub dimensions: Vec<DimensionLine>,
    /// Annotations on the kept side.
    pub annotations: Vec<Annotation2D>,
    /// Lowest elevation over retained elements.
    pub min_elevation: f64,
    /// Highest elevation over retained elements.
    pub max_elevation: f64,
    /// `max_elevation − min_elevation`.
    pub height: f64,
    /// Bounds of everything drawn; `(0, 0, 0, 0)` when empty.
    pub bounds: BoundingBox2D,
    /// Non-fatal conditions.
    pub diagnostics: Vec<Diagnostic>,
}

/// What `project_kept` added to the view.
#[derive(Debug, Default, Clone, Copy)]
struct KeptDrawing {
    beyond: bool,
    cut_faces: bool,
}

impl KeptDrawing {
    fn any(self) -> bool {
        self.beyond || self.cut_faces
    }
}

/// Generates section views.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionViewGenerator;

impl SectionViewGenerator {
    /// Generate a section; fails without a valid plane.
    pub fn generate<M: ModelProvider + ?Sized>(
        &self,
        model: &M,
        request: &SectionRequest,
    ) -> Result<SectionView> {
        let plane = request.validate()?;
        let slicer = PlaneSlicer::new(plane)?;
        let projector = Projector::from_basis(*slicer.basis(), true)
            .with_anchor(ProjectionAnchor::Fixed(plane.origin));
        let library = request.settings.hatch.library();
        let ctx = CutContext {
            model,
            slicer: &slicer,
            library: &library,
            hatch: &request.settings.hatch,
        };

        let mut view = SectionView {
            plane: plane.clone(),
            scale: request.settings.scale,
            cut_surfaces: Vec::new(),
            openings: Vec::new(),
            projection: ProjectedMesh::new(projector.basis().view_direction),
            elements: ElementGroups::default(),
            dimensions: Vec::new(),
            annotations: Vec::new(),
            min_elevation: 0.0,
            max_elevation: 0.0,
            height: 0.0,
            bounds: BoundingBox2D::zero(),
            diagnostics: Vec::new(),
        };
        if slicer.basis().up_substituted {
            tracing::warn!("section up vector is parallel to the plane normal, using canonical up");
            view.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UpVectorSubstituted,
                None,
                "up vector parallel to the plane normal was replaced",
            ));
        }
        let mut elevations: Vec<f64> = Vec::new();

        for element in model.elements() {
            if element.kind == ElementKind::Room
                || !check_geometry(element, &mut view.diagnostics)
            {
                continue;
            }
            let vertices = element.world_vertices();
            let distances: Vec<f64> = vertices.iter().map(|p| slicer.signed_distance(p)).collect();
            let nearest = distances.iter().copied().fold(f64::INFINITY, f64::min);
            let farthest = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if farthest < -EPSILON {
                continue;
            }
            if let Some(depth) = request.view_depth {
                if nearest > depth {
                    continue;
                }
            }
            let is_cut = nearest < -EPSILON && farthest > EPSILON;

            let drawn = match element.kind {
                ElementKind::Wall
                | ElementKind::Floor
                | ElementKind::Column
                | ElementKind::Beam
                | ElementKind::Roof
                    if is_cut =>
                {
                    let (surfaces, _) = ctx.cut_element(element, &mut view.diagnostics);
                    let hatch = surfaces.first().map(|s| s.hatch);
                    view.cut_surfaces.extend(surfaces);
                    self.project_kept(
                        &slicer,
                        &projector,
                        &vertices,
                        &element.mesh.faces,
                        hatch,
                        &mut view,
                    );
                    true
                }
                ElementKind::Door | ElementKind::Window if is_cut => {
                    let loops = ctx.cut_loops(element, &mut view.diagnostics);
                    let polygon = loops
                        .into_iter()
                        .find(|l| !l.is_hole)
                        .map(|l| l.points)
                        .unwrap_or_default();
                    let params = element.opening;
                    let span = BoundingBox2D::from_points(&polygon).width();
                    view.openings.push(Opening {
                        element: element.id,
                        host: element.host,
                        kind: if element.kind == ElementKind::Door {
                            OpeningKind::Door
                        } else {
                            OpeningKind::Window
                        },
                        polygon,
                        width: params.map_or(span, |p| p.width),
                        height: params.map_or(element.elevation.height(), |p| p.height),
                        sill_height: params.map_or(0.0, |p| p.sill_height),
                    });
                    true
                }
                _ => {
                    let found = library.resolve(model, element.material.as_deref());
                    let drawn = self.project_kept(
                        &slicer,
                        &projector,
                        &vertices,
                        &element.mesh.faces,
                        Some(found.kind),
                        &mut view,
                    );
                    if drawn.cut_faces && found.fallback {
                        flag_material_fallback(element, &mut view.diagnostics);
                    }
                    drawn.any()
                }
            };

            if drawn {
                view.elements.push(element.kind, element.id);
                elevations.push(element.elevation.base);
                elevations.push(element.elevation.top);
            }
        }

        if let (Some(lo), Some(hi)) = (
            elevations.iter().copied().reduce(f64::min),
            elevations.iter().copied().reduce(f64::max),
        ) {
            view.min_elevation = lo;
            view.max_elevation = hi;
            view.height = hi - lo;
        }

        let origin = plane.origin_point();
        for annotation in model.annotations() {
            let p = from_array(annotation.position);
            let d = slicer.signed_distance(&p);
            if slicer.classify(&p) == Side::Back {
                continue;
            }
            if request.view_depth.is_some_and(|depth| d > depth) {
                continue;
            }
            let (position, depth) = project_annotation(&projector, &origin, annotation.position);
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
                .chain(view.openings.iter().flat_map(|o| o.polygon.iter())),
        );
        view.dimensions = self.elevation_dimensions(&slicer, &elevations, &view.bounds, request);

        tracing::debug!(
            cut_surfaces = view.cut_surfaces.len(),
            openings = view.openings.len(),
            height = view.height,
            "generated section view"
        );
        Ok(view)
    }

    /// Project the FRONT part of a mesh as geometry beyond the cut.
    ///
    /// Faces lying in the plane are classified as cut faces and tagged with
    /// `hatch`.
    fn project_kept(
        &self,
        slicer: &PlaneSlicer,
        projector: &Projector,
        vertices: &[Point3],
        faces: &[Vec<u32>],
        hatch: Option<HatchKind>,
        view: &mut SectionView,
    ) -> KeptDrawing {
        let result = slicer.slice_mesh(vertices, faces);
        let kept: Vec<_> = result.kept_faces.into_iter().map(|f| f.points).collect();
        let coplanar: Vec<_> = result.cut_faces.into_iter().map(|f| f.points).collect();

        let mut drawn = KeptDrawing::default();
        if !kept.is_empty() {
            let mesh = project_polygons(projector, &kept);
            if !mesh.edges.is_empty() {
                view.projection.merge(mesh);
                drawn.beyond = true;
            }
        }
        if !coplanar.is_empty() {
            let mut mesh = project_polygons(projector, &coplanar);
            for face in &mut mesh.faces {
                face.class = FaceClass::Cut;
                face.hatch = hatch;
            }
            if !mesh.faces.is_empty() {
                view.projection.merge(mesh);
                drawn.cut_faces = true;
            }
        }
        drawn
    }

    /// One vertical dimension per consecutive pair of distinct elevations.
    ///
    /// Skipped when the drawing's up axis has no vertical component.
    fn elevation_dimensions(
        &self,
        slicer: &PlaneSlicer,
        elevations: &[f64],
        bounds: &BoundingBox2D,
        request: &SectionRequest,
    ) -> Vec<DimensionLine> {
        let up_z = slicer.basis().up.z;
        if up_z.abs() < EPSILON || elevations.is_empty() {
            return Vec::new();
        }
        let mut levels = elevations.to_vec();
        levels.sort_by(f64::total_cmp);
        levels.dedup_by(|a, b| (*a - *b).abs() < 1e-6);

        let origin_z = slicer.plane().origin[2];
        let x = bounds.min_x - request.settings.dimension_offset;
        let y = |z: f64| (z - origin_z) * up_z;
        levels
            .windows(2)
            .map(|w| {
                DimensionLine::with_value(
                    Point2D::new(x, y(w[0])),
                    Point2D::new(x, y(w[1])),
                    w[1] - w[0],
                )
            })
            .collect()
    }
}
