#![warn(missing_docs)]

//! Building model snapshot for the archdraw drawing engine.
//!
//! This crate defines the contract between the drawing engine and whatever
//! owns the parametric building model. The engine only ever reads through
//! [`ModelProvider`]; [`BuildingModel`] is a plain serializable snapshot that
//! implements it.

pub mod mesh;

use std::collections::{HashMap, HashSet};

use archdraw_math::{from_array, Point3, Transform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mesh::ElementMesh;

/// Stable identity of an element within a model.
pub type ElementId = u64;

/// Errors raised while loading or validating a model snapshot.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Document is not valid JSON for the model schema.
    #[error("invalid model document: {0}")]
    Json(#[from] serde_json::Error),

    /// Two elements share the same id.
    #[error("duplicate element id {0}")]
    DuplicateId(ElementId),

    /// A face references a vertex that does not exist.
    #[error("element {element}: face {face} references missing vertex {index}")]
    InvalidFace {
        /// Offending element.
        element: ElementId,
        /// Face index within the element mesh.
        face: usize,
        /// Out-of-range vertex index.
        index: u32,
    },

    /// An opening names a host that is not in the model.
    #[error("element {element}: host {host} not found")]
    MissingHost {
        /// Opening element.
        element: ElementId,
        /// Missing host id.
        host: ElementId,
    },
}

/// Building element categories the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Load-bearing or partition wall.
    Wall,
    /// Door leaf and frame.
    Door,
    /// Window frame and glazing.
    Window,
    /// Vertical structural member.
    Column,
    /// Horizontal structural member.
    Beam,
    /// Roof surface or slab.
    Roof,
    /// Floor slab.
    Floor,
    /// Room volume (space boundary).
    Room,
    /// Loose furniture and fittings.
    Furniture,
}

impl ElementKind {
    /// All kinds, in declaration order.
    pub const ALL: [ElementKind; 9] = [
        ElementKind::Wall,
        ElementKind::Door,
        ElementKind::Window,
        ElementKind::Column,
        ElementKind::Beam,
        ElementKind::Roof,
        ElementKind::Floor,
        ElementKind::Room,
        ElementKind::Furniture,
    ];

    /// True for doors and windows.
    pub fn is_opening(self) -> bool {
        matches!(self, ElementKind::Door | ElementKind::Window)
    }
}

/// Vertical extent of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRange {
    /// Lowest Z.
    pub base: f64,
    /// Highest Z.
    pub top: f64,
}

impl ElevationRange {
    /// Create a range, swapping the bounds if given out of order.
    pub fn new(base: f64, top: f64) -> Self {
        if base <= top {
            Self { base, top }
        } else {
            Self { base: top, top: base }
        }
    }

    /// True if `z` lies within the range (inclusive).
    pub fn contains(&self, z: f64) -> bool {
        z >= self.base && z <= self.top
    }

    /// True if this range overlaps `[lo, hi]`.
    pub fn overlaps(&self, lo: f64, hi: f64) -> bool {
        self.base <= hi && self.top >= lo
    }

    /// Height of the range.
    pub fn height(&self) -> f64 {
        self.top - self.base
    }
}

impl Default for ElevationRange {
    fn default() -> Self {
        Self { base: 0.0, top: 0.0 }
    }
}

/// Nominal dimensions of a door or window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningParams {
    /// Clear width.
    pub width: f64,
    /// Clear height.
    pub height: f64,
    /// Height of the sill above the host's base (0 for doors).
    #[serde(default)]
    pub sill_height: f64,
}

/// A single building element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Stable identity.
    pub id: ElementId,
    /// Category.
    pub kind: ElementKind,
    /// Optional human-readable name (room names, door marks).
    #[serde(default)]
    pub name: Option<String>,
    /// Material identifier, resolved through [`ModelProvider::material`].
    #[serde(default)]
    pub material: Option<String>,
    /// Geometry in element-local coordinates.
    pub mesh: ElementMesh,
    /// Vertical extent in world coordinates.
    pub elevation: ElevationRange,
    /// Door/window dimensions.
    #[serde(default)]
    pub opening: Option<OpeningParams>,
    /// Wall hosting this opening.
    #[serde(default)]
    pub host: Option<ElementId>,
    /// Local-to-world placement; identity when absent.
    #[serde(default)]
    pub placement: Option<Transform>,
}

impl Element {
    /// Create an element; the elevation range is taken from the mesh.
    pub fn new(id: ElementId, kind: ElementKind, mesh: ElementMesh) -> Self {
        let (base, top) = mesh.z_extent().unwrap_or((0.0, 0.0));
        Self {
            id,
            kind,
            name: None,
            material: None,
            mesh,
            elevation: ElevationRange::new(base, top),
            opening: None,
            host: None,
            placement: None,
        }
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the material identifier.
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Attach door/window dimensions.
    pub fn with_opening(mut self, opening: OpeningParams) -> Self {
        self.opening = Some(opening);
        self
    }

    /// Set the hosting wall.
    pub fn with_host(mut self, host: ElementId) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the placement and refresh the world elevation range.
    pub fn with_placement(mut self, placement: Transform) -> Self {
        self.placement = Some(placement);
        let world = self.world_vertices();
        if let Some((lo, hi)) = world.iter().fold(None, |acc: Option<(f64, f64)>, p| {
            Some(acc.map_or((p.z, p.z), |(lo, hi)| (lo.min(p.z), hi.max(p.z))))
        }) {
            self.elevation = ElevationRange::new(lo, hi);
        }
        self
    }

    /// Mesh vertices in world coordinates.
    pub fn world_vertices(&self) -> Vec<Point3> {
        match &self.placement {
            Some(t) => self
                .mesh
                .vertices
                .iter()
                .map(|v| t.apply_point(&from_array(*v)))
                .collect(),
            None => self.mesh.points(),
        }
    }
}

/// Material definition referenced by elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Material identifier (e.g. "c30_concrete").
    pub name: String,
    /// Generic category used for hatching (e.g. "concrete", "timber").
    #[serde(default)]
    pub category: Option<String>,
    /// Display color as `[r, g, b]` in 0.0..1.0.
    #[serde(default)]
    pub color: Option<[f64; 3]>,
}

/// A text annotation anchored in model space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation3D {
    /// Annotation text.
    pub text: String,
    /// Anchor point `[x, y, z]`.
    pub position: [f64; 3],
    /// Element the annotation describes, if any.
    #[serde(default)]
    pub element: Option<ElementId>,
}

/// Read-only access to a building model snapshot.
///
/// The engine never mutates the provider; `Sync` lets one snapshot be shared
/// by generators running on different threads.
pub trait ModelProvider: Sync {
    /// All elements in a stable order.
    fn elements(&self) -> &[Element];

    /// Model-space annotations.
    fn annotations(&self) -> &[Annotation3D] {
        &[]
    }

    /// Look up a material definition by identifier.
    fn material(&self, _name: &str) -> Option<&MaterialDef> {
        None
    }

    /// Look up an element by id.
    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements().iter().find(|e| e.id == id)
    }

    /// Elements of one kind, in model order.
    fn elements_of(&self, kind: ElementKind) -> Box<dyn Iterator<Item = &Element> + '_> {
        Box::new(self.elements().iter().filter(move |e| e.kind == kind))
    }

    /// World-space axis-aligned bounds over every element vertex.
    fn bounds(&self) -> Option<(Point3, Point3)> {
        let mut result: Option<(Point3, Point3)> = None;
        for element in self.elements() {
            for p in element.world_vertices() {
                result = Some(match result {
                    None => (p, p),
                    Some((lo, hi)) => (
                        Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                        Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
                    ),
                });
            }
        }
        result
    }

    /// Volumetric center of the model (center of its bounds).
    fn volumetric_center(&self) -> Option<Point3> {
        self.bounds().map(|(lo, hi)| bounds_center(&lo, &hi))
    }
}

fn bounds_center(lo: &Point3, hi: &Point3) -> Point3 {
    Point3::new(
        (lo.x + hi.x) / 2.0,
        (lo.y + hi.y) / 2.0,
        (lo.z + hi.z) / 2.0,
    )
}

/// A serializable building model snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingModel {
    /// Format version string.
    pub version: String,
    /// Elements in model order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Material definitions keyed by identifier.
    #[serde(default)]
    pub materials: HashMap<String, MaterialDef>,
    /// Model-space annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation3D>,
}

impl Default for BuildingModel {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            elements: Vec::new(),
            materials: HashMap::new(),
            annotations: Vec::new(),
        }
    }
}

impl BuildingModel {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Register a material definition.
    pub fn add_material(&mut self, material: MaterialDef) {
        self.materials.insert(material.name.clone(), material);
    }

    /// Check ids are unique, faces index real vertices and hosts exist.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(ModelError::DuplicateId(element.id));
            }
            if let Some((face, index)) = element.mesh.first_invalid_face() {
                return Err(ModelError::InvalidFace {
                    element: element.id,
                    face,
                    index,
                });
            }
        }
        for element in &self.elements {
            if let Some(host) = element.host {
                if !seen.contains(&host) {
                    return Err(ModelError::MissingHost {
                        element: element.id,
                        host,
                    });
                }
            }
        }
        Ok(())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }
}

impl ModelProvider for BuildingModel {
    fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn annotations(&self) -> &[Annotation3D] {
        &self.annotations
    }

    fn material(&self, name: &str) -> Option<&MaterialDef> {
        self.materials.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> BuildingModel {
        let mut model = BuildingModel::new();
        model.push(
            Element::new(
                1,
                ElementKind::Wall,
                ElementMesh::cuboid([0.0, 0.0, 0.0], [5.0, 0.2, 3.0]),
            )
            .with_material("concrete"),
        );
        model.push(
            Element::new(
                2,
                ElementKind::Door,
                ElementMesh::cuboid([1.0, 0.0, 0.0], [1.9, 0.2, 2.1]),
            )
            .with_opening(OpeningParams {
                width: 0.9,
                height: 2.1,
                sill_height: 0.0,
            })
            .with_host(1),
        );
        model.add_material(MaterialDef {
            name: "concrete".to_string(),
            category: Some("concrete".to_string()),
            color: None,
        });
        model
    }

    #[test]
    fn roundtrip_model() {
        let model = sample_model();
        let json = model.to_json().expect("serialize");
        let restored = BuildingModel::from_json(&json).expect("deserialize");
        assert_eq!(model, restored);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ElementKind::Furniture).unwrap();
        assert_eq!(json, r#""furniture""#);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut model = sample_model();
        let dup = model.elements[0].clone();
        model.push(dup);
        assert!(matches!(model.validate(), Err(ModelError::DuplicateId(1))));
    }

    #[test]
    fn missing_host_rejected() {
        let mut model = sample_model();
        model.elements[1].host = Some(99);
        assert!(matches!(
            model.validate(),
            Err(ModelError::MissingHost { element: 2, host: 99 })
        ));
    }

    #[test]
    fn provider_queries() {
        let model = sample_model();
        assert_eq!(model.elements_of(ElementKind::Wall).count(), 1);
        assert_eq!(model.elements_of(ElementKind::Room).count(), 0);
        assert_eq!(model.element(2).map(|e| e.kind), Some(ElementKind::Door));

        let (lo, hi) = model.bounds().unwrap();
        assert_eq!(lo, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(hi, Point3::new(5.0, 0.2, 3.0));
        let c = model.volumetric_center().unwrap();
        assert!((c.x - 2.5).abs() < 1e-12 && (c.z - 1.5).abs() < 1e-12);
    }

    #[test]
    fn empty_model_has_no_bounds() {
        let model = BuildingModel::new();
        assert!(model.bounds().is_none());
        assert!(model.volumetric_center().is_none());
    }

    #[test]
    fn placement_updates_elevation() {
        let e = Element::new(7, ElementKind::Column, ElementMesh::cuboid([0.0; 3], [0.3, 0.3, 3.0]))
            .with_placement(Transform::translation(0.0, 0.0, 3.0));
        assert_eq!(e.elevation, ElevationRange::new(3.0, 6.0));
        assert!((e.world_vertices()[0].z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn rotated_placement_moves_footprint() {
        let placement = Transform::translation(10.0, 0.0, 0.0)
            .then(&Transform::rotation_z(std::f64::consts::FRAC_PI_2));
        let e = Element::new(8, ElementKind::Wall, ElementMesh::cuboid([0.0; 3], [4.0, 0.2, 3.0]))
            .with_placement(placement);
        let model = BuildingModel {
            elements: vec![e],
            ..BuildingModel::default()
        };
        let (lo, hi) = model.bounds().unwrap();
        assert!((lo.x - 9.8).abs() < 1e-9 && (hi.x - 10.0).abs() < 1e-9);
        assert!(lo.y.abs() < 1e-9 && (hi.y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn elevation_range_queries() {
        let r = ElevationRange::new(3.0, 0.0);
        assert_eq!(r.base, 0.0);
        assert!(r.contains(1.5));
        assert!(!r.contains(3.5));
        assert!(r.overlaps(2.5, 4.0));
        assert!(!r.overlaps(3.5, 4.0));
        assert!((r.height() - 3.0).abs() < 1e-12);
    }
}
