//! Front-face and exterior classification of faces.

use archdraw_math::{try_normalize, Point3, Vec3, EPSILON};

use crate::error::{DraftingError, Result};
use crate::types::{Face3D, FaceClass};

/// Classifies faces relative to a view direction and, optionally, a point
/// known to be inside the building.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityAnalyzer {
    view_direction: Vec3,
    interior_point: Option<Point3>,
    epsilon: f64,
}

impl VisibilityAnalyzer {
    /// Create an analyzer for a view direction pointing towards the viewer.
    pub fn new(view_direction: Vec3) -> Result<Self> {
        let view_direction = try_normalize(&view_direction).ok_or_else(|| {
            DraftingError::InvalidViewDirection("view direction must be non-zero".into())
        })?;
        Ok(Self {
            view_direction,
            interior_point: None,
            epsilon: EPSILON,
        })
    }

    /// Set the interior reference point used by [`is_exterior`](Self::is_exterior).
    pub fn with_interior_point(mut self, point: Point3) -> Self {
        self.interior_point = Some(point);
        self
    }

    /// Override the front-face threshold.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Unit view direction.
    pub fn view_direction(&self) -> &Vec3 {
        &self.view_direction
    }

    /// Interior reference point, if any.
    pub fn interior_point(&self) -> Option<&Point3> {
        self.interior_point.as_ref()
    }

    /// `normal·view_direction > ε` after normalizing `normal`.
    pub fn is_visible(&self, normal: &Vec3) -> bool {
        try_normalize(normal).is_some_and(|n| n.dot(&self.view_direction) > self.epsilon)
    }

    /// Visible and pointing away from the interior point.
    ///
    /// Without an interior point this is the visibility test alone. A face
    /// whose centroid coincides with the interior point is never exterior.
    pub fn is_exterior(&self, face: &Face3D) -> bool {
        if !face.reliable || !self.is_visible(&face.normal) {
            return false;
        }
        match &self.interior_point {
            None => true,
            Some(interior) => try_normalize(&(face.centroid - interior))
                .is_some_and(|outward| outward.dot(&face.normal) > self.epsilon),
        }
    }

    /// Exterior or interior; cut faces are classified by the slicer.
    pub fn classify(&self, face: &Face3D) -> FaceClass {
        if self.is_exterior(face) {
            FaceClass::Exterior
        } else {
            FaceClass::Interior
        }
    }

    /// Indices of visible normals, in input order.
    pub fn get_visible_faces(&self, normals: &[Vec3]) -> Vec<usize> {
        normals
            .iter()
            .enumerate()
            .filter(|(_, n)| self.is_visible(n))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of exterior faces, in input order.
    pub fn filter_exterior_faces(&self, faces: &[Face3D]) -> Vec<usize> {
        faces
            .iter()
            .enumerate()
            .filter(|(_, f)| self.is_exterior(f))
            .map(|(i, _)| i)
            .collect()
    }
}
