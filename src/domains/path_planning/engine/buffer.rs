use super::frame::LocalFrame;
use crate::domains::geometry::ObstacleSet;
use geo::orient::{Direction, Orient};
use geo::{BoundingRect, Contains, Coord, Intersects, Line, Polygon as GeoPolygon, Rect};
use geo_buf::buffer_polygon_rounded;

/// Fraction of a segment trimmed off each end when the segment starts or ends
/// on an obstacle boundary.
const ENDPOINT_SLACK: f64 = 1e-6;

/// A preprocessed obstacle in the planar frame with a cached bounding box.
#[derive(Debug, Clone)]
pub struct Blocker {
    shape: GeoPolygon<f64>,
    bounds: Rect<f64>,
}

impl Blocker {
    pub fn new(shape: GeoPolygon<f64>) -> Option<Self> {
        let bounds = shape.bounding_rect()?;
        Some(Self { shape, bounds })
    }

    pub fn shape(&self) -> &GeoPolygon<f64> {
        &self.shape
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    fn bounds_contain(&self, c: Coord<f64>) -> bool {
        let (min, max) = (self.bounds.min(), self.bounds.max());
        c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y
    }

    fn bounds_overlap(&self, a: Coord<f64>, b: Coord<f64>) -> bool {
        let (min, max) = (self.bounds.min(), self.bounds.max());
        a.x.max(b.x) >= min.x && a.x.min(b.x) <= max.x && a.y.max(b.y) >= min.y && a.y.min(b.y) <= max.y
    }

    /// Inside or on the boundary.
    pub fn touches_point(&self, c: Coord<f64>) -> bool {
        self.bounds_contain(c) && self.shape.intersects(&c)
    }

    /// Strictly inside, the boundary does not count.
    pub fn contains_point(&self, c: Coord<f64>) -> bool {
        self.bounds_contain(c) && self.shape.contains(&c)
    }

    pub fn touches_segment(&self, a: Coord<f64>, b: Coord<f64>) -> bool {
        self.bounds_overlap(a, b) && self.shape.intersects(&Line::new(a, b))
    }
}

/// Grow one planar obstacle outward by `buffer` meters with rounded joins.
///
/// Rings are oriented first, so either winding grows outward. An obstacle is
/// never lost: if offsetting yields nothing the unbuffered shape is kept.
pub fn grow(shape: &GeoPolygon<f64>, buffer: f64) -> Vec<GeoPolygon<f64>> {
    let shape = shape.orient(Direction::Default);
    if buffer <= 0.0 {
        return vec![shape];
    }
    let grown = buffer_polygon_rounded(&shape, buffer).0;
    if grown.is_empty() {
        tracing::warn!(buffer, "buffering produced no geometry, keeping the obstacle unbuffered");
        return vec![shape];
    }
    grown
}

/// Project, buffer and index every obstacle of a request.
pub fn prepare(frame: &LocalFrame, obstacles: &ObstacleSet, buffer: f64) -> Vec<Blocker> {
    obstacles
        .polygons()
        .flat_map(|p| grow(&frame.polygon_to_planar(p), buffer))
        .filter_map(Blocker::new)
        .collect()
}

pub fn any_touches_point(blockers: &[Blocker], c: Coord<f64>) -> bool {
    blockers.iter().any(|b| b.touches_point(c))
}

pub fn any_contains_point(blockers: &[Blocker], c: Coord<f64>) -> bool {
    blockers.iter().any(|b| b.contains_point(c))
}

/// Segment check for a leg that starts or ends at a waypoint. A waypoint on an
/// obstacle boundary may leave it, so a touch right at either end is allowed.
pub fn any_blocks_endpoint_segment(blockers: &[Blocker], a: Coord<f64>, b: Coord<f64>) -> bool {
    let slack = Coord {
        x: (b.x - a.x) * ENDPOINT_SLACK,
        y: (b.y - a.y) * ENDPOINT_SLACK,
    };
    any_touches_segment(blockers, a + slack, b - slack)
}

pub fn any_touches_segment(blockers: &[Blocker], a: Coord<f64>, b: Coord<f64>) -> bool {
    blockers.iter().any(|blocker| blocker.touches_segment(a, b))
}
