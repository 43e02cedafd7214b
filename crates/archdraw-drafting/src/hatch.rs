//! Hatch patterns for cut surfaces.
//!
//! Every pattern is a family of strokes laid out on a grid anchored at the
//! drawing origin, so adjacent regions hatched with the same pattern line up.
//! Generation is a pure function of `(bounds, scale, angle)`.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use archdraw_model::ModelProvider;
use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox2D, Point2D, Segment2D};

/// Tolerance for intersection parameters.
const TOLERANCE: f64 = 1e-10;

/// Upper bound on parallel lines per family; larger requests return nothing.
pub const MAX_LINES: usize = 20_000;

/// Upper bound on strokes for patterns that break lines into pieces.
pub const MAX_STROKES: usize = 200_000;

/// The fixed set of hatch patterns.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HatchKind {
    /// Diagonal lines with scattered aggregate ticks.
    Concrete,
    /// Closely spaced double lines.
    Steel,
    /// Sinusoidal grain lines.
    WoodGrain,
    /// Single diagonal lines (default for unknown materials).
    #[default]
    Diagonal,
    /// Two perpendicular line families.
    Crosshatch,
}

impl HatchKind {
    /// All patterns.
    pub const ALL: [HatchKind; 5] = [
        HatchKind::Concrete,
        HatchKind::Steel,
        HatchKind::WoodGrain,
        HatchKind::Diagonal,
        HatchKind::Crosshatch,
    ];

    /// Line spacing at scale 1.0, in drawing units.
    pub fn base_spacing(self) -> f64 {
        match self {
            HatchKind::Concrete => 0.3,
            HatchKind::Steel => 0.1,
            HatchKind::WoodGrain => 0.2,
            HatchKind::Diagonal | HatchKind::Crosshatch => 0.25,
        }
    }

    /// Line spacing for a scale multiplier.
    pub fn spacing(self, scale: f64) -> f64 {
        self.base_spacing() * scale
    }

    /// The generator implementing this pattern.
    pub fn generator(self) -> &'static dyn PatternGenerator {
        match self {
            HatchKind::Concrete => &ConcreteHatch,
            HatchKind::Steel => &SteelHatch,
            HatchKind::WoodGrain => &WoodGrainHatch,
            HatchKind::Diagonal => &DiagonalHatch,
            HatchKind::Crosshatch => &CrosshatchHatch,
        }
    }

    /// Tile `bounds` with this pattern.
    pub fn generate_pattern(
        self,
        bounds: &BoundingBox2D,
        scale: f64,
        angle: f64,
    ) -> Vec<Segment2D> {
        self.generator().generate_pattern(bounds, scale, angle)
    }

    /// Hatch a polygon with holes.
    ///
    /// The pattern is generated over the polygon's bounds and each stroke is
    /// split at boundary and hole edges; pieces are kept when their midpoint
    /// is inside the boundary and outside every hole.
    pub fn fill_polygon(
        self,
        boundary: &[Point2D],
        holes: &[Vec<Point2D>],
        scale: f64,
        angle: f64,
    ) -> Vec<Segment2D> {
        if boundary.len() < 3 {
            return Vec::new();
        }
        let bounds = BoundingBox2D::from_points(boundary);
        let mut result = Vec::new();
        for (a, b) in self.generate_pattern(&bounds, scale, angle) {
            for piece in split_segment(&a, &b, boundary, holes) {
                let mid = piece.0.midpoint(&piece.1);
                if point_in_polygon(&mid, boundary)
                    && !holes.iter().any(|h| point_in_polygon(&mid, h))
                {
                    result.push(piece);
                }
            }
        }
        result
    }
}

/// A deterministic 2D stroke generator.
pub trait PatternGenerator: Sync {
    /// Which pattern this is.
    fn kind(&self) -> HatchKind;

    /// Strokes covering `bounds`, spaced by `kind().spacing(scale)` and
    /// rotated `angle` degrees counter-clockwise from the +X axis.
    ///
    /// Returns no strokes for a non-positive scale, non-finite angle or
    /// empty bounds.
    fn generate_pattern(&self, bounds: &BoundingBox2D, scale: f64, angle: f64) -> Vec<Segment2D>;
}

/// Diagonal lines plus short aggregate ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcreteHatch;

/// Pairs of close parallel lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteelHatch;

/// Wavy grain lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct WoodGrainHatch;

/// Plain diagonal lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagonalHatch;

/// Two perpendicular line families.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosshatchHatch;

impl PatternGenerator for DiagonalHatch {
    fn kind(&self) -> HatchKind {
        HatchKind::Diagonal
    }

    fn generate_pattern(&self, bounds: &BoundingBox2D, scale: f64, angle: f64) -> Vec<Segment2D> {
        let Some(family) = LineFamily::new(bounds, self.kind().spacing(scale), angle) else {
            return Vec::new();
        };
        family.lines(bounds, 0.0).map(|(_, seg)| seg).collect()
    }
}

impl PatternGenerator for CrosshatchHatch {
    fn kind(&self) -> HatchKind {
        HatchKind::Crosshatch
    }

    fn generate_pattern(&self, bounds: &BoundingBox2D, scale: f64, angle: f64) -> Vec<Segment2D> {
        let spacing = self.kind().spacing(scale);
        let (Some(first), Some(second)) = (
            LineFamily::new(bounds, spacing, angle),
            LineFamily::new(bounds, spacing, angle + 90.0),
        ) else {
            return Vec::new();
        };
        first
            .lines(bounds, 0.0)
            .chain(second.lines(bounds, 0.0))
            .map(|(_, seg)| seg)
            .collect()
    }
}

impl PatternGenerator for SteelHatch {
    fn kind(&self) -> HatchKind {
        HatchKind::Steel
    }

    fn generate_pattern(&self, bounds: &BoundingBox2D, scale: f64, angle: f64) -> Vec<Segment2D> {
        let spacing = self.kind().spacing(scale);
        let Some(family) = LineFamily::new(bounds, spacing, angle) else {
            return Vec::new();
        };
        let mut strokes = Vec::new();
        for (_, seg) in family.lines(bounds, 0.0) {
            strokes.push(seg);
        }
        for (_, seg) in family.lines(bounds, 0.25 * spacing) {
            strokes.push(seg);
        }
        strokes
    }
}

impl PatternGenerator for ConcreteHatch {
    fn kind(&self) -> HatchKind {
        HatchKind::Concrete
    }

    fn generate_pattern(&self, bounds: &BoundingBox2D, scale: f64, angle: f64) -> Vec<Segment2D> {
        let spacing = self.kind().spacing(scale);
        let Some(family) = LineFamily::new(bounds, spacing, angle) else {
            return Vec::new();
        };

        let pitch = 3.0 * spacing;
        if !family.within_budget(bounds, pitch) {
            return Vec::new();
        }
        let mut strokes = Vec::new();
        let tick = 0.3 * spacing;
        for (k, (a, b)) in family.lines(bounds, 0.0) {
            strokes.push((a, b));

            // Aggregate ticks sit halfway to the next line, on a grid along
            // the line whose phase depends only on the line index.
            let phase = (k * 7).rem_euclid(5) as f64 / 5.0 * pitch;
            let (t0, t1) = (family.along(&a), family.along(&b));
            let first = ((t0 - phase) / pitch).ceil() as i64;
            let last = ((t1 - phase) / pitch).floor() as i64;
            for j in first..=last {
                let t = phase + j as f64 * pitch;
                let center = family.point(k as f64 * spacing + 0.5 * spacing, t);
                let dir = family.rotated(60.0);
                let p0 = Point2D::new(center.x - dir.x * tick / 2.0, center.y - dir.y * tick / 2.0);
                let p1 = Point2D::new(center.x + dir.x * tick / 2.0, center.y + dir.y * tick / 2.0);
                if let Some(seg) = clip_segment_to_rect(&p0, &p1, bounds) {
                    strokes.push(seg);
                }
            }
        }
        strokes
    }
}

impl PatternGenerator for WoodGrainHatch {
    fn kind(&self) -> HatchKind {
        HatchKind::WoodGrain
    }

    fn generate_pattern(&self, bounds: &BoundingBox2D, scale: f64, angle: f64) -> Vec<Segment2D> {
        let spacing = self.kind().spacing(scale);
        let amplitude = 0.25 * spacing;
        let wavelength = 4.0 * spacing;
        let step = wavelength / 8.0;

        // Lines whose straight axis is just outside the bounds can still
        // wave into them.
        let outer = bounds.inflate(amplitude);
        let Some(family) = LineFamily::new(&outer, spacing, angle) else {
            return Vec::new();
        };
        if !family.within_budget(&outer, step) {
            return Vec::new();
        }

        let mut strokes = Vec::new();
        for (k, (a, b)) in family.lines(&outer, 0.0) {
            let phase = k as f64 * 0.7;
            let offset = k as f64 * spacing;
            let (t0, t1) = (family.along(&a), family.along(&b));
            let samples = ((t1 - t0) / step).ceil().max(1.0) as usize;
            let wave = |t: f64| {
                let lateral = amplitude * (2.0 * PI * t / wavelength + phase).sin();
                family.point(offset + lateral, t)
            };
            let mut prev = wave(t0);
            for i in 1..=samples {
                let t = (t0 + i as f64 * step).min(t1);
                let next = wave(t);
                if let Some(seg) = clip_segment_to_rect(&prev, &next, bounds) {
                    strokes.push(seg);
                }
                prev = next;
            }
        }
        strokes
    }
}

/// Parallel lines `P·perp = k·spacing (+ shift)` covering a rectangle.
struct LineFamily {
    spacing: f64,
    dir: Point2D,
    perp: Point2D,
    k_min: i64,
    k_max: i64,
}

impl LineFamily {
    fn new(bounds: &BoundingBox2D, spacing: f64, angle: f64) -> Option<Self> {
        if !(spacing.is_finite() && spacing > 0.0) || !angle.is_finite() {
            return None;
        }
        if !bounds.is_valid() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return None;
        }
        let rad = angle.to_radians();
        let dir = Point2D::new(rad.cos(), rad.sin());
        let perp = Point2D::new(-dir.y, dir.x);

        let corners = [
            Point2D::new(bounds.min_x, bounds.min_y),
            Point2D::new(bounds.max_x, bounds.min_y),
            Point2D::new(bounds.max_x, bounds.max_y),
            Point2D::new(bounds.min_x, bounds.max_y),
        ];
        let (lo, hi) = corners.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            let o = c.x * perp.x + c.y * perp.y;
            (lo.min(o), hi.max(o))
        });
        // One extra line on each side so strokes shifted by a fraction of
        // the spacing still reach the edges.
        let k_min = (lo / spacing).floor() as i64 - 1;
        let k_max = (hi / spacing).ceil() as i64;
        if k_max.saturating_sub(k_min) as usize > MAX_LINES {
            let lines = k_max.saturating_sub(k_min);
            tracing::warn!(spacing, lines, "hatch too dense, skipped");
            return None;
        }
        Some(Self {
            spacing,
            dir,
            perp,
            k_min,
            k_max,
        })
    }

    /// Whether cutting every line into pieces of length `pitch` stays under
    /// [`MAX_STROKES`].
    fn within_budget(&self, bounds: &BoundingBox2D, pitch: f64) -> bool {
        let lines = (self.k_max - self.k_min + 1) as f64;
        let longest = bounds.width().hypot(bounds.height());
        let strokes = lines * (longest / pitch + 1.0);
        if strokes > MAX_STROKES as f64 {
            tracing::warn!(pitch, strokes, "hatch too dense, skipped");
            return false;
        }
        true
    }

    /// Point at perpendicular offset `offset` and distance `t` along the lines.
    fn point(&self, offset: f64, t: f64) -> Point2D {
        Point2D::new(
            self.perp.x * offset + self.dir.x * t,
            self.perp.y * offset + self.dir.y * t,
        )
    }

    /// Distance of `p` along the line direction.
    fn along(&self, p: &Point2D) -> f64 {
        p.x * self.dir.x + p.y * self.dir.y
    }

    /// Line direction rotated by `degrees`.
    fn rotated(&self, degrees: f64) -> Point2D {
        let (s, c) = degrees.to_radians().sin_cos();
        Point2D::new(self.dir.x * c - self.dir.y * s, self.dir.x * s + self.dir.y * c)
    }

    /// Every line of the family clipped to `bounds`, with its index.
    fn lines<'a>(
        &'a self,
        bounds: &'a BoundingBox2D,
        shift: f64,
    ) -> impl Iterator<Item = (i64, Segment2D)> + 'a {
        (self.k_min..=self.k_max).filter_map(move |k| {
            let origin = self.point(k as f64 * self.spacing + shift, 0.0);
            clip_line_to_rect(&origin, &self.dir, bounds).map(|seg| (k, seg))
        })
    }
}

/// Liang–Barsky clip of the infinite line `origin + t·dir`.
fn clip_line_to_rect(origin: &Point2D, dir: &Point2D, rect: &BoundingBox2D) -> Option<Segment2D> {
    let (t0, t1) = liang_barsky(origin, dir, rect, f64::NEG_INFINITY, f64::INFINITY)?;
    let a = Point2D::new(origin.x + dir.x * t0, origin.y + dir.y * t0);
    let b = Point2D::new(origin.x + dir.x * t1, origin.y + dir.y * t1);
    (a.distance(&b) > TOLERANCE).then_some((a, b))
}

/// Liang–Barsky clip of the segment `a`–`b`.
fn clip_segment_to_rect(a: &Point2D, b: &Point2D, rect: &BoundingBox2D) -> Option<Segment2D> {
    let dir = Point2D::new(b.x - a.x, b.y - a.y);
    let (t0, t1) = liang_barsky(a, &dir, rect, 0.0, 1.0)?;
    let p0 = a.lerp(b, t0);
    let p1 = a.lerp(b, t1);
    (p0.distance(&p1) > TOLERANCE).then_some((p0, p1))
}

fn liang_barsky(
    origin: &Point2D,
    dir: &Point2D,
    rect: &BoundingBox2D,
    mut t0: f64,
    mut t1: f64,
) -> Option<(f64, f64)> {
    let checks = [
        (-dir.x, origin.x - rect.min_x),
        (dir.x, rect.max_x - origin.x),
        (-dir.y, origin.y - rect.min_y),
        (dir.y, rect.max_y - origin.y),
    ];
    for (p, q) in checks {
        if p.abs() < TOLERANCE {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    (t0.is_finite() && t1.is_finite()).then_some((t0, t1))
}

/// Split `a`–`b` at every crossing with the boundary or hole edges.
fn split_segment(
    a: &Point2D,
    b: &Point2D,
    boundary: &[Point2D],
    holes: &[Vec<Point2D>],
) -> Vec<Segment2D> {
    let mut ts = vec![0.0, 1.0];
    for ring in std::iter::once(boundary).chain(holes.iter().map(Vec::as_slice)) {
        let n = ring.len();
        for i in 0..n {
            if let Some(t) = segment_intersection(a, b, &ring[i], &ring[(i + 1) % n]) {
                ts.push(t);
            }
        }
    }
    ts.sort_by(f64::total_cmp);
    ts.dedup_by(|x, y| (*x - *y).abs() < TOLERANCE);
    ts.windows(2)
        .map(|w| (a.lerp(b, w[0]), a.lerp(b, w[1])))
        .collect()
}

/// Parameter along `p0`–`p1` where it crosses edge `e0`–`e1`, if strictly inside the segment.
fn segment_intersection(p0: &Point2D, p1: &Point2D, e0: &Point2D, e1: &Point2D) -> Option<f64> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let ex = e1.x - e0.x;
    let ey = e1.y - e0.y;

    let denom = dx * ey - dy * ex;
    if denom.abs() < TOLERANCE {
        return None;
    }

    let t = ((e0.x - p0.x) * ey - (e0.y - p0.y) * ex) / denom;
    let s = ((e0.x - p0.x) * dy - (e0.y - p0.y) * dx) / denom;
    ((0.0..=1.0).contains(&s) && t > 0.0 && t < 1.0).then_some(t)
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: &Point2D, polygon: &[Point2D]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = &polygon[i];
        let vj = &polygon[j];
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Result of resolving a material name to a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatchLookup {
    /// Pattern to draw.
    pub kind: HatchKind,
    /// True when the material was unknown and the default pattern was used.
    pub fallback: bool,
}

/// Material name to hatch pattern registry.
///
/// Built-in aliases cover common material families; `overrides` take
/// precedence and are keyed by normalized material name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HatchLibrary {
    /// Project-specific assignments.
    #[serde(default)]
    pub overrides: BTreeMap<String, HatchKind>,
}

const ALIASES: &[(&str, HatchKind)] = &[
    ("reinforced concrete", HatchKind::Concrete),
    ("concrete", HatchKind::Concrete),
    ("masonry", HatchKind::Concrete),
    ("steel", HatchKind::Steel),
    ("metal", HatchKind::Steel),
    ("iron", HatchKind::Steel),
    ("aluminium", HatchKind::Steel),
    ("aluminum", HatchKind::Steel),
    ("wood", HatchKind::WoodGrain),
    ("timber", HatchKind::WoodGrain),
    ("brick", HatchKind::Crosshatch),
    ("insulation", HatchKind::Crosshatch),
];

fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl HatchLibrary {
    /// Library with project overrides.
    pub fn with_overrides(overrides: BTreeMap<String, HatchKind>) -> Self {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(name, kind)| (normalize(&name), kind))
                .collect(),
        }
    }

    /// Resolve a material name.
    ///
    /// Overrides match the whole normalized name; built-in aliases match
    /// whole words (so "c30 concrete" resolves to concrete). Anything else,
    /// including a missing name, is the diagonal fallback.
    pub fn lookup(&self, material: Option<&str>) -> HatchLookup {
        let fallback = HatchLookup {
            kind: HatchKind::default(),
            fallback: true,
        };
        let Some(name) = material.map(normalize).filter(|n| !n.is_empty()) else {
            return fallback;
        };
        if let Some(&kind) = self.overrides.get(&name) {
            return HatchLookup {
                kind,
                fallback: false,
            };
        }
        let padded = format!(" {name} ");
        ALIASES
            .iter()
            .find(|(alias, _)| padded.contains(&format!(" {alias} ")))
            .map(|&(_, kind)| HatchLookup {
                kind,
                fallback: false,
            })
            .unwrap_or(fallback)
    }

    /// Resolve an element's material through the model's material table.
    ///
    /// The material's category is tried first, then its identifier.
    pub fn resolve<M: ModelProvider + ?Sized>(
        &self,
        model: &M,
        material: Option<&str>,
    ) -> HatchLookup {
        let category = material
            .and_then(|name| model.material(name))
            .and_then(|def| def.category.as_deref());
        if category.is_some() {
            let by_category = self.lookup(category);
            if !by_category.fallback {
                return by_category;
            }
        }
        self.lookup(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(min, min),
            Point2D::new(max, min),
            Point2D::new(max, max),
            Point2D::new(min, max),
        ]
    }

    #[test]
    fn test_patterns_deterministic() {
        let bounds = BoundingBox2D::new(-3.0, 1.0, 4.5, 7.0);
        for kind in HatchKind::ALL {
            let a = kind.generate_pattern(&bounds, 1.5, 30.0);
            let b = kind.generate_pattern(&bounds, 1.5, 30.0);
            assert!(!a.is_empty(), "{kind:?} produced nothing");
            assert_eq!(a, b, "{kind:?} not deterministic");
        }
    }

    #[test]
    fn test_strokes_stay_inside_bounds() {
        let bounds = BoundingBox2D::new(0.0, 0.0, 5.0, 3.0);
        let tol = 1e-9;
        for kind in HatchKind::ALL {
            for (a, b) in kind.generate_pattern(&bounds, 1.0, 17.0) {
                for p in [a, b] {
                    assert!(bounds.inflate(tol).contains(&p), "{kind:?} stroke at {p:?}");
                }
            }
        }
    }

    #[test]
    fn test_spacing_scales_linearly() {
        let bounds = BoundingBox2D::new(0.0, 0.0, 10.0, 10.0);
        let fine = HatchKind::Diagonal.generate_pattern(&bounds, 1.0, 0.0);
        let coarse = HatchKind::Diagonal.generate_pattern(&bounds, 2.0, 0.0);
        // Horizontal lines at multiples of the spacing.
        assert_eq!(fine.len(), 41);
        assert_eq!(coarse.len(), 21);
        let ys: Vec<f64> = coarse.iter().map(|(a, _)| a.y).collect();
        for w in ys.windows(2) {
            assert!((w[1] - w[0] - 0.5).abs() < 1e-10);
        }
    }

    #[test]
    fn test_no_gap_at_boundary() {
        let bounds = BoundingBox2D::new(0.13, 0.0, 3.0, 2.0);
        let spacing = HatchKind::Diagonal.spacing(1.0);
        let lines = HatchKind::Diagonal.generate_pattern(&bounds, 1.0, 90.0);
        let mut xs: Vec<f64> = lines.iter().map(|(a, _)| a.x).collect();
        xs.sort_by(f64::total_cmp);
        assert!(xs[0] - bounds.min_x <= spacing);
        assert!(bounds.max_x - xs[xs.len() - 1] <= spacing);
    }

    #[test]
    fn test_stroke_total_is_capped() {
        let huge = BoundingBox2D::new(0.0, 0.0, 1000.0, 1000.0);
        for kind in HatchKind::ALL {
            assert!(kind.generate_pattern(&huge, 1.0, 30.0).len() <= MAX_STROKES, "{kind:?}");
        }
        assert!(HatchKind::WoodGrain.generate_pattern(&huge, 1.0, 0.0).is_empty());
        assert!(HatchKind::Concrete.generate_pattern(&huge, 1.0, 45.0).is_empty());

        let room = BoundingBox2D::new(0.0, 0.0, 20.0, 20.0);
        assert!(!HatchKind::WoodGrain.generate_pattern(&room, 1.0, 0.0).is_empty());
    }

    #[test]
    fn test_crosshatch_has_two_families() {
        let bounds = BoundingBox2D::new(0.0, 0.0, 1.0, 1.0);
        let lines = HatchKind::Crosshatch.generate_pattern(&bounds, 1.0, 0.0);
        let horizontal = lines.iter().filter(|(a, b)| (a.y - b.y).abs() < 1e-9).count();
        let vertical = lines.iter().filter(|(a, b)| (a.x - b.x).abs() < 1e-9).count();
        assert_eq!(horizontal, 5);
        assert_eq!(vertical, 5);
    }

    #[test]
    fn test_wood_grain_is_wavy() {
        let bounds = BoundingBox2D::new(0.0, 0.0, 4.0, 4.0);
        let strokes = HatchKind::WoodGrain.generate_pattern(&bounds, 1.0, 0.0);
        assert!(strokes.iter().any(|(a, b)| (a.y - b.y).abs() > 1e-6));
    }

    #[test]
    fn test_invalid_input_yields_nothing() {
        let bounds = BoundingBox2D::new(0.0, 0.0, 1.0, 1.0);
        assert!(HatchKind::Steel.generate_pattern(&bounds, 0.0, 45.0).is_empty());
        assert!(HatchKind::Steel.generate_pattern(&bounds, -1.0, 45.0).is_empty());
        assert!(HatchKind::Steel.generate_pattern(&bounds, 1.0, f64::NAN).is_empty());
        assert!(HatchKind::Steel
            .generate_pattern(&BoundingBox2D::empty(), 1.0, 45.0)
            .is_empty());
        assert!(HatchKind::Diagonal
            .generate_pattern(&bounds, 1e-9, 45.0)
            .is_empty());
    }

    #[test]
    fn test_fill_polygon_respects_holes() {
        let outer = square(0.0, 4.0);
        let hole: Vec<Point2D> = square(1.0, 3.0).into_iter().rev().collect();
        let strokes = HatchKind::Diagonal.fill_polygon(&outer, &[hole.clone()], 1.0, 45.0);
        assert!(!strokes.is_empty());
        for (a, b) in &strokes {
            let mid = a.midpoint(b);
            assert!(point_in_polygon(&mid, &outer));
            assert!(!point_in_polygon(&mid, &hole));
        }
    }

    #[test]
    fn test_lookup_aliases() {
        let lib = HatchLibrary::default();
        let kind = |m: &str| lib.lookup(Some(m));
        assert_eq!(kind("Concrete").kind, HatchKind::Concrete);
        assert_eq!(kind("reinforced_concrete").kind, HatchKind::Concrete);
        assert_eq!(kind("C30 concrete").kind, HatchKind::Concrete);
        assert_eq!(kind("timber").kind, HatchKind::WoodGrain);
        assert_eq!(kind("Structural-Steel").kind, HatchKind::Steel);
        assert_eq!(kind("brick").kind, HatchKind::Crosshatch);
        assert!(!kind("brick").fallback);
    }

    #[test]
    fn test_unknown_material_falls_back() {
        let lib = HatchLibrary::default();
        for m in [Some("unobtainium"), Some("   "), None, Some("ironic")] {
            let found = lib.lookup(m);
            assert_eq!(found.kind, HatchKind::Diagonal);
            assert!(found.fallback, "{m:?} should be flagged");
        }
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Clay_Brick".to_string(), HatchKind::Concrete);
        let lib = HatchLibrary::with_overrides(overrides);
        assert_eq!(lib.lookup(Some("clay brick")).kind, HatchKind::Concrete);
        assert_eq!(lib.lookup(Some("brick")).kind, HatchKind::Crosshatch);
    }
}
