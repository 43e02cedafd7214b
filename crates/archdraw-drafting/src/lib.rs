#![warn(missing_docs)]

//! 2D architectural drawing generation from 3D building models.
//!
//! The crate turns a [`ModelProvider`](archdraw_model::ModelProvider)
//! snapshot into plan, section and elevation drawings:
//!
//! - **Projection**: orthographic projection onto an arbitrary view basis
//! - **Visibility**: back-face culling and exterior-face detection
//! - **Slicing**: plane/mesh intersection into closed cut polygons with holes
//! - **Hatching**: deterministic material patterns clipped to cut surfaces
//!
//! # Example
//!
//! ```ignore
//! use archdraw_drafting::{PlanRequest, PlanViewGenerator};
//! use archdraw_model::BuildingModel;
//!
//! let model: BuildingModel = /* ... */;
//! let levels = [0.0, 3.0, 6.0];
//! let plans = PlanViewGenerator.generate_multi_level(&model, &levels, &PlanRequest::default())?;
//!
//! for surface in &plans[0].cut_surfaces {
//!     println!("{:?}: {} hatch lines", surface.hatch, surface.hatch_lines.len());
//! }
//! ```

pub mod error;
pub mod hatch;
pub mod projection;
pub mod slicer;
pub mod types;
pub mod views;
pub mod visibility;

pub use error::{DraftingError, Result};
pub use hatch::{HatchKind, HatchLibrary, HatchLookup, PatternGenerator};
pub use projection::{ProjectedMesh, ProjectionAnchor, Projector, ViewBasis};
pub use slicer::{CutLoop, PlaneSlicer, Side, SliceCase, SliceResult};
pub use types::{
    BoundingBox2D, CutSurface, Diagnostic, DiagnosticKind, Face3D, LineStyle, Opening,
    OpeningKind, Point2D, ProjectedEdge, ProjectedFace, SectionPlane, Segment2D,
};
pub use views::{
    generate_view, CardinalDirection, DimensionLine, DrawingSettings, ElevationRequest,
    ElevationView, ElevationViewGenerator, HatchSettings, PlanRequest, PlanView,
    PlanViewGenerator, SectionRequest, SectionView, SectionViewGenerator, ViewRequest,
    ViewResult,
};
pub use visibility::VisibilityAnalyzer;

#[cfg(test)]
mod tests {
    use super::*;
    use archdraw_math::{Point3, Vec3};
    use archdraw_model::{BuildingModel, Element, ElementKind, ElementMesh};

    fn same_segment(a: &ProjectedEdge, b: &ProjectedEdge) -> bool {
        let (a0, a1) = (a.start.position, a.end.position);
        let (b0, b1) = (b.start.position, b.end.position);
        let close = |p: Point2D, q: Point2D| p.distance(&q) < 1e-9;
        (close(a0, b0) && close(a1, b1)) || (close(a0, b1) && close(a1, b0))
    }

    #[test]
    fn test_cube_top_view_outline() {
        let cube = ElementMesh::cuboid([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]);
        let projector = Projector::new(Vec3::new(0.0, 0.0, -1.0), Vec3::y(), false).unwrap();
        let view = projector.project_mesh(&cube.points(), &cube.faces, None);

        assert!((view.bounds.width() - 2.0).abs() < 1e-9);
        assert!((view.bounds.height() - 2.0).abs() < 1e-9);
        assert_eq!(view.edges.len(), 12);

        // Edges along the view axis collapse; the rest overlap in pairs.
        let (points, lines): (Vec<&ProjectedEdge>, Vec<&ProjectedEdge>) =
            view.edges.iter().partition(|e| e.length() < 1e-9);
        assert_eq!(points.len(), 4);
        for p in &points {
            assert_eq!(points.iter().filter(|q| same_segment(p, q)).count(), 1);
        }
        for line in &lines {
            assert_eq!(lines.iter().filter(|other| same_segment(line, other)).count(), 2);
        }
    }

    #[test]
    fn test_cube_slice_at_mid_height() {
        let cube = ElementMesh::cuboid([-0.5, -0.5, -0.5], [0.5, 0.5, 0.5]);
        let plane = SectionPlane::with_default_up(Point3::origin(), Vec3::z());
        let slicer = PlaneSlicer::new(&plane).unwrap();
        let result = slicer.slice_mesh(&cube.points(), &cube.faces);

        assert_eq!(result.count(Side::Back), 4);
        assert_eq!(result.count(Side::Front), 4);
        assert_eq!(result.count(Side::On), 0);

        let loops = slicer.compute_cut_polygon(&result);
        assert_eq!(loops.len(), 1);
        assert!(loops[0].closed);
        assert_eq!(loops[0].points.len(), 4);
        assert!((loops[0].area - 1.0).abs() < 1e-9);
        for (a, b) in &result.cut_edges {
            assert!(a.z.abs() < 1e-12 && b.z.abs() < 1e-12);
        }
    }

    #[test]
    fn test_concrete_hatch_stays_near_bounds() {
        let bounds = BoundingBox2D::new(0.0, 0.0, 10.0, 10.0);
        let lines = HatchKind::Concrete.generate_pattern(&bounds, 1.0, 45.0);
        assert!(!lines.is_empty());

        let margin = bounds.inflate(HatchKind::Concrete.spacing(1.0));
        for (a, b) in &lines {
            assert!(margin.contains(&a.midpoint(b)));
        }
        assert_eq!(lines, HatchKind::Concrete.generate_pattern(&bounds, 1.0, 45.0));
    }

    #[test]
    fn test_south_elevation_keeps_south_facing_wall() {
        let center = Point3::origin();
        let analyzer = VisibilityAnalyzer::new(CardinalDirection::South.view_direction())
            .unwrap()
            .with_interior_point(center);
        let facing = Face3D::new(vec![
            Point3::new(-1.0, 5.0, 0.0),
            Point3::new(-1.0, 5.0, 1.0),
            Point3::new(1.0, 5.0, 1.0),
            Point3::new(1.0, 5.0, 0.0),
        ]);
        let away = Face3D::new(vec![
            Point3::new(1.0, -5.0, 0.0),
            Point3::new(1.0, -5.0, 1.0),
            Point3::new(-1.0, -5.0, 1.0),
            Point3::new(-1.0, -5.0, 0.0),
        ]);
        assert!(analyzer.is_visible(&facing.normal));
        assert!(analyzer.is_exterior(&facing));
        assert!(!analyzer.is_visible(&away.normal));
        assert!(!analyzer.is_exterior(&away));

        let mut model = BuildingModel::new();
        model.push(Element::new(
            1,
            ElementKind::Wall,
            ElementMesh::cuboid([-5.0, 4.9, 0.0], [5.0, 5.1, 3.0]),
        ));
        model.push(Element::new(
            2,
            ElementKind::Wall,
            ElementMesh::cuboid([-5.0, -5.1, 0.0], [5.0, -4.9, 3.0]),
        ));
        let view = ElevationViewGenerator
            .generate(&model, &ElevationRequest::new(CardinalDirection::South))
            .unwrap();
        assert_eq!(view.elements.walls(), &[1]);
    }

    #[test]
    fn test_multi_level_plans_are_independent() {
        let mut model = BuildingModel::new();
        model.push(
            Element::new(
                1,
                ElementKind::Wall,
                ElementMesh::cuboid([0.0, 0.0, -1.0], [4.0, 0.2, 8.0]),
            )
            .with_material("concrete"),
        );

        let mut plans = PlanViewGenerator
            .generate_multi_level(&model, &[0.0, 3.0, 6.0], &PlanRequest::default())
            .unwrap();
        let levels: Vec<f64> = plans.iter().map(|p| p.cut_level).collect();
        assert_eq!(levels, vec![0.0, 3.0, 6.0]);
        for plan in &plans {
            assert_eq!(plan.cut_surfaces.len(), 1);
        }

        let untouched = plans[2].clone();
        plans[0].cut_surfaces.clear();
        plans[1].cut_surfaces[0].polygon.reverse();
        assert_eq!(plans[2], untouched);
        assert_eq!(plans[1].cut_surfaces.len(), 1);
    }
}
