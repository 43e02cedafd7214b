//! View generators and the types they share.
//!
//! Every generator is stateless: it takes a model snapshot and an immutable
//! request and returns a self-contained result holding no reference to the
//! model. Different views of one snapshot can be generated concurrently.

pub mod elevation;
pub mod plan;
pub mod section;

use std::collections::BTreeMap;

use archdraw_math::{from_array, Point3};
use archdraw_model::{Element, ElementId, ElementKind, ModelProvider};
use serde::{Deserialize, Serialize};

use crate::error::{DraftingError, Result};
use crate::hatch::{point_in_polygon, HatchKind, HatchLibrary};
use crate::projection::{ProjectedMesh, Projector};
use crate::slicer::{CutLoop, PlaneSlicer};
use crate::types::{
    BoundingBox2D, CutSurface, Diagnostic, DiagnosticKind, Point2D, ProjectedEdge,
};

pub use elevation::{CardinalDirection, ElevationRequest, ElevationView, ElevationViewGenerator};
pub use plan::{PlanRequest, PlanView, PlanViewGenerator, RoomLabel};
pub use section::{SectionRequest, SectionView, SectionViewGenerator};

/// Hatch configuration applied to every cut surface of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HatchSettings {
    /// Spacing multiplier.
    pub scale: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Material name to pattern overrides.
    pub materials: BTreeMap<String, HatchKind>,
}

impl Default for HatchSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            angle: 45.0,
            materials: BTreeMap::new(),
        }
    }
}

impl HatchSettings {
    /// Registry with the configured overrides.
    pub fn library(&self) -> HatchLibrary {
        HatchLibrary::with_overrides(self.materials.clone())
    }
}

/// Drafting conventions shared by all views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingSettings {
    /// Drawing scale denominator (100.0 means 1:100).
    pub scale: f64,
    /// Hatching of cut surfaces.
    pub hatch: HatchSettings,
    /// Distance between geometry and dimension lines, in model units.
    pub dimension_offset: f64,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            scale: 100.0,
            hatch: HatchSettings::default(),
            dimension_offset: 0.5,
        }
    }
}

impl DrawingSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(DraftingError::InvalidRequest(
                "scale must be positive".into(),
            ));
        }
        if !(self.hatch.scale.is_finite() && self.hatch.scale > 0.0) {
            return Err(DraftingError::InvalidRequest(
                "hatch scale must be positive".into(),
            ));
        }
        if !self.hatch.angle.is_finite() {
            return Err(DraftingError::InvalidRequest(
                "hatch angle must be finite".into(),
            ));
        }
        if !(self.dimension_offset.is_finite() && self.dimension_offset >= 0.0) {
            return Err(DraftingError::InvalidRequest(
                "dimension offset must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// A measured distance between two drawing points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionLine {
    /// Start point.
    pub start: Point2D,
    /// End point.
    pub end: Point2D,
    /// Measured value in model units.
    pub value: f64,
    /// Formatted value.
    pub label: String,
}

impl DimensionLine {
    /// Dimension measuring the drawn length.
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self::with_value(start, end, start.distance(&end))
    }

    /// Dimension with an explicit value.
    pub fn with_value(start: Point2D, end: Point2D, value: f64) -> Self {
        Self {
            start,
            end,
            value,
            label: format!("{value:.2}"),
        }
    }
}

/// A 3D annotation transferred into view coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation2D {
    /// Annotation text.
    pub text: String,
    /// Position in view coordinates.
    pub position: Point2D,
    /// Depth along the view direction.
    pub depth: f64,
    /// Annotated element.
    pub element: Option<ElementId>,
}

/// A named level marker placed beside an elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMarker {
    /// Level name.
    pub name: String,
    /// Height in model units.
    pub elevation: f64,
    /// Marker position.
    pub position: Point2D,
}

/// A reference line drawn across a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    /// Start point.
    pub start: Point2D,
    /// End point.
    pub end: Point2D,
    /// Label.
    pub label: String,
}

/// Projected edges of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementOutline {
    /// Source element.
    pub element: ElementId,
    /// Element category.
    pub kind: ElementKind,
    /// Edges in view coordinates.
    pub edges: Vec<ProjectedEdge>,
}

/// Element ids drawn in a view, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementGroups(pub BTreeMap<ElementKind, Vec<ElementId>>);

impl ElementGroups {
    /// Record an element, ignoring repeats.
    pub fn push(&mut self, kind: ElementKind, id: ElementId) {
        let ids = self.0.entry(kind).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Ids of one category, in model order.
    pub fn ids(&self, kind: ElementKind) -> &[ElementId] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Walls.
    pub fn walls(&self) -> &[ElementId] {
        self.ids(ElementKind::Wall)
    }

    /// Doors.
    pub fn doors(&self) -> &[ElementId] {
        self.ids(ElementKind::Door)
    }

    /// Windows.
    pub fn windows(&self) -> &[ElementId] {
        self.ids(ElementKind::Window)
    }

    /// Roofs.
    pub fn roofs(&self) -> &[ElementId] {
        self.ids(ElementKind::Roof)
    }

    /// Everything that is not a wall, door, window or roof.
    pub fn others(&self) -> Vec<ElementId> {
        self.0
            .iter()
            .filter(|(kind, _)| {
                !matches!(
                    kind,
                    ElementKind::Wall | ElementKind::Door | ElementKind::Window | ElementKind::Roof
                )
            })
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// True if no element was drawn.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Any view request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewRequest {
    /// Horizontal plan cut.
    Plan(PlanRequest),
    /// Section through an arbitrary plane.
    Section(SectionRequest),
    /// Cardinal elevation.
    Elevation(ElevationRequest),
}

/// Any generated view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewResult {
    /// Plan view.
    Plan(PlanView),
    /// Section view.
    Section(SectionView),
    /// Elevation view.
    Elevation(ElevationView),
}

impl ViewResult {
    /// Bounds of the drawn geometry.
    pub fn bounds(&self) -> &BoundingBox2D {
        match self {
            ViewResult::Plan(v) => &v.bounds,
            ViewResult::Section(v) => &v.bounds,
            ViewResult::Elevation(v) => &v.bounds,
        }
    }

    /// Non-fatal conditions recorded while generating.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ViewResult::Plan(v) => &v.diagnostics,
            ViewResult::Section(v) => &v.diagnostics,
            ViewResult::Elevation(v) => &v.diagnostics,
        }
    }
}

/// Generate whichever view `request` describes.
pub fn generate_view<M: ModelProvider + ?Sized>(
    model: &M,
    request: &ViewRequest,
) -> Result<ViewResult> {
    Ok(match request {
        ViewRequest::Plan(r) => ViewResult::Plan(PlanViewGenerator.generate(model, r)?),
        ViewRequest::Section(r) => ViewResult::Section(SectionViewGenerator.generate(model, r)?),
        ViewRequest::Elevation(r) => {
            ViewResult::Elevation(ElevationViewGenerator.generate(model, r)?)
        }
    })
}

/// Report unusable geometry; returns false when the element should be skipped.
pub(crate) fn check_geometry(element: &Element, diagnostics: &mut Vec<Diagnostic>) -> bool {
    if element.mesh.is_empty() {
        tracing::debug!(element = element.id, "element has no geometry");
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::EmptyGeometry,
            Some(element.id),
            "element has no vertices or faces",
        ));
        return false;
    }
    if let Some((face, index)) = element.mesh.first_invalid_face() {
        tracing::warn!(element = element.id, face, index, "face references missing vertex");
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::DegenerateFace,
            Some(element.id),
            format!("face {face} references missing vertex {index}"),
        ));
    }
    true
}

/// Project an element and record faces whose normal could not be derived.
pub(crate) fn project_element(
    projector: &Projector,
    element: &Element,
    faces: &[Vec<u32>],
    diagnostics: &mut Vec<Diagnostic>,
) -> (ProjectedMesh, ElementOutline) {
    let vertices = element.world_vertices();
    let mesh = projector.project_mesh(&vertices, faces, None);
    let unreliable = mesh.faces.iter().filter(|f| !f.reliable).count();
    if unreliable > 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::DegenerateFace,
            Some(element.id),
            format!("{unreliable} face(s) without a usable normal"),
        ));
    }
    let outline = ElementOutline {
        element: element.id,
        kind: element.kind,
        edges: mesh.visible_edges().cloned().collect(),
    };
    (mesh, outline)
}

/// Project loose polygons (e.g. clipped faces) as one mesh.
pub(crate) fn project_polygons(projector: &Projector, polygons: &[Vec<Point3>]) -> ProjectedMesh {
    let mut vertices = Vec::new();
    let mut faces = Vec::with_capacity(polygons.len());
    for poly in polygons {
        let start = vertices.len() as u32;
        vertices.extend_from_slice(poly);
        faces.push((start..start + poly.len() as u32).collect());
    }
    projector.project_mesh(&vertices, &faces, None)
}

/// Everything needed to turn cut loops into hatched surfaces.
pub(crate) struct CutContext<'a, M: ModelProvider + ?Sized> {
    pub model: &'a M,
    pub slicer: &'a PlaneSlicer,
    pub library: &'a HatchLibrary,
    pub hatch: &'a HatchSettings,
}

impl<M: ModelProvider + ?Sized> CutContext<'_, M> {
    /// Slice an element and build one hatched surface per outer loop.
    ///
    /// Holes are attached to the outer loop containing them. Returns the
    /// closed loops too so callers can derive openings or room outlines.
    pub fn cut_element(
        &self,
        element: &Element,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<CutSurface>, Vec<CutLoop>) {
        let loops = self.cut_loops(element, diagnostics);
        if loops.is_empty() {
            return (Vec::new(), loops);
        }

        let found = self.library.resolve(self.model, element.material.as_deref());
        if found.fallback {
            flag_material_fallback(element, diagnostics);
        }

        let (holes, outers): (Vec<&CutLoop>, Vec<&CutLoop>) =
            loops.iter().partition(|l| l.is_hole);
        let surfaces = outers
            .into_iter()
            .map(|outer| {
                let inner: Vec<Vec<Point2D>> = holes
                    .iter()
                    .filter(|h| {
                        point_in_polygon(&h.points[0].midpoint(&h.points[1]), &outer.points)
                    })
                    .map(|h| h.points.clone())
                    .collect();
                let hatch_lines = found.kind.fill_polygon(
                    &outer.points,
                    &inner,
                    self.hatch.scale,
                    self.hatch.angle,
                );
                CutSurface {
                    element: Some(element.id),
                    polygon: outer.points.clone(),
                    holes: inner,
                    material: element.material.clone(),
                    hatch: found.kind,
                    hatch_scale: self.hatch.scale,
                    hatch_angle: self.hatch.angle,
                    hatch_lines,
                }
            })
            .collect();
        (surfaces, loops)
    }

    /// Closed cut loops of an element; open chains become diagnostics.
    pub fn cut_loops(&self, element: &Element, diagnostics: &mut Vec<Diagnostic>) -> Vec<CutLoop> {
        let vertices = element.world_vertices();
        let result = self.slicer.slice_mesh(&vertices, &element.mesh.faces);
        if !result.degenerate_faces.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::DegenerateFace,
                Some(element.id),
                format!("{} degenerate face(s) skipped", result.degenerate_faces.len()),
            ));
        }
        let (closed, open): (Vec<CutLoop>, Vec<CutLoop>) = self
            .slicer
            .compute_cut_polygon(&result)
            .into_iter()
            .partition(|l| l.closed);
        if !open.is_empty() {
            tracing::warn!(element = element.id, chains = open.len(), "cut edges did not close");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::OpenCutLoop,
                Some(element.id),
                format!("{} open cut chain(s)", open.len()),
            ));
        }
        closed
    }
}

/// Record that `element` was hatched with the fallback pattern.
pub(crate) fn flag_material_fallback(element: &Element, diagnostics: &mut Vec<Diagnostic>) {
    tracing::warn!(
        element = element.id,
        material = element.material.as_deref().unwrap_or("<none>"),
        "unknown material, using diagonal hatch"
    );
    diagnostics.push(Diagnostic::new(
        DiagnosticKind::MaterialFallback,
        Some(element.id),
        format!(
            "material {:?} has no hatch, using diagonal",
            element.material.as_deref().unwrap_or("")
        ),
    ));
}

/// Annotation position in view coordinates.
pub(crate) fn project_annotation(
    projector: &Projector,
    reference: &Point3,
    position: [f64; 3],
) -> (Point2D, f64) {
    let p = from_array(position);
    (
        projector.project_point(&p, reference),
        projector.get_depth(&p, reference),
    )
}

/// Union of bounds, `(0, 0, 0, 0)` when nothing was drawn.
pub(crate) fn union_bounds<'a>(
    boxes: impl IntoIterator<Item = BoundingBox2D>,
    points: impl IntoIterator<Item = &'a Point2D>,
) -> BoundingBox2D {
    let mut bounds = BoundingBox2D::empty();
    for b in boxes {
        if b.is_valid() {
            bounds.include_box(&b);
        }
    }
    for p in points {
        bounds.include_point(*p);
    }
    bounds.or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        assert!(DrawingSettings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = DrawingSettings::default();
        settings.hatch.scale = 0.0;
        assert!(matches!(settings.validate(), Err(DraftingError::InvalidRequest(_))));

        let mut settings = DrawingSettings::default();
        settings.dimension_offset = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_dimension_label() {
        let d = DimensionLine::new(Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0));
        assert_eq!(d.value, 5.0);
        assert_eq!(d.label, "5.00");
    }

    #[test]
    fn test_groups() {
        let mut groups = ElementGroups::default();
        groups.push(ElementKind::Wall, 1);
        groups.push(ElementKind::Wall, 1);
        groups.push(ElementKind::Column, 7);
        groups.push(ElementKind::Door, 3);
        assert_eq!(groups.walls(), &[1]);
        assert_eq!(groups.doors(), &[3]);
        assert!(groups.windows().is_empty());
        assert_eq!(groups.others(), vec![7]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_union_bounds_empty_is_zero() {
        assert_eq!(
            union_bounds(Vec::<BoundingBox2D>::new(), std::iter::empty::<&Point2D>()),
            BoundingBox2D::zero()
        );
    }

    #[test]
    fn test_settings_from_partial_json() {
        let json = r#"{"hatch": {"angle": 30.0, "materials": {"cork": "crosshatch"}}}"#;
        let settings: DrawingSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.scale, 100.0);
        assert_eq!(settings.hatch.angle, 30.0);
        assert_eq!(settings.hatch.scale, 1.0);
        assert_eq!(settings.hatch.materials["cork"], HatchKind::Crosshatch);
    }
}
