//! Obstacle-avoiding shortest path computation.
//!
//! The engine is a pure function of its request: obstacles are grown by the
//! buffer distance, the area is discretized at the requested resolution and
//! the grid graph is searched with A*. Identical requests always produce
//! identical paths; nodes are inserted row-major so the search order is fixed.

pub mod buffer;
pub mod frame;
pub mod grid;
pub mod search;

use self::buffer::{any_blocks_endpoint_segment, any_contains_point, Blocker};
use self::frame::LocalFrame;
use super::request::{CancelToken, EngineError, PathRequest};
use crate::domains::geometry::{LinePath, ObstacleSet, Point, Polygon};

pub const DEFAULT_MAX_GRID_CELLS: usize = 1_000_000;
pub const DEFAULT_BBOX_PADDING: f64 = 0.15;

/// Port the dispatcher and the map synchronizer run routing through.
pub trait PathEngine: Send + Sync + 'static {
    /// Shortest path from `request.start` through any via points to `request.end`.
    fn compute(&self, request: &PathRequest, cancel: &CancelToken) -> Result<LinePath, EngineError>;

    /// Obstacles as the search sees them, grown by `buffer` meters. `stops`
    /// are the waypoints the obstacles will be routed around, if any.
    fn preprocess(
        &self,
        obstacles: &ObstacleSet,
        buffer: f64,
        stops: &[Point],
    ) -> Result<Vec<Polygon>, EngineError>;
}

#[derive(Debug, Clone)]
pub struct GridPathEngine {
    max_grid_cells: usize,
    bbox_padding: f64,
}

impl Default for GridPathEngine {
    fn default() -> Self {
        Self {
            max_grid_cells: DEFAULT_MAX_GRID_CELLS,
            bbox_padding: DEFAULT_BBOX_PADDING,
        }
    }
}

impl GridPathEngine {
    pub fn new(max_grid_cells: usize, bbox_padding: f64) -> Self {
        Self {
            max_grid_cells,
            bbox_padding,
        }
    }

    fn route_leg(
        &self,
        frame: &LocalFrame,
        blockers: &[Blocker],
        from: Point,
        to: Point,
        resolution: f64,
        cancel: &CancelToken,
    ) -> Result<Vec<Point>, EngineError> {
        let source = frame.to_planar(from);
        let target = frame.to_planar(to);

        if any_contains_point(blockers, source) || any_contains_point(blockers, target) {
            tracing::debug!(?from, ?to, "leg endpoint lies inside an obstacle");
            return Err(EngineError::NoPathFound);
        }
        if !any_blocks_endpoint_segment(blockers, source, target) {
            return Ok(vec![from, to]);
        }

        let grid = grid::build(
            source,
            target,
            blockers,
            resolution,
            self.bbox_padding,
            self.max_grid_cells,
            cancel,
        )?;
        cancel.check()?;

        let coords = search::shortest_route(&grid).ok_or(EngineError::NoPathFound)?;
        let coords = search::clean_coords(coords);
        let last = coords.len().saturating_sub(1);
        Ok(coords
            .into_iter()
            .enumerate()
            .map(|(i, c)| match i {
                0 => from,
                i if i == last => to,
                _ => frame.to_geodetic(c),
            })
            .collect())
    }
}

fn frame_for(stops: &[Point], obstacles: &ObstacleSet) -> LocalFrame {
    LocalFrame::around(
        stops
            .iter()
            .copied()
            .chain(obstacles.polygons().flat_map(|p| p.exterior.iter().copied())),
    )
}

impl PathEngine for GridPathEngine {
    fn compute(&self, request: &PathRequest, cancel: &CancelToken) -> Result<LinePath, EngineError> {
        request.validate()?;
        cancel.check()?;

        let stops = request.stops();
        let frame = frame_for(&stops, &request.obstacles);
        let blockers = buffer::prepare(&frame, &request.obstacles, request.params.buffer);
        cancel.check()?;

        let mut route: Vec<Point> = Vec::new();
        for leg in stops.windows(2) {
            let points = self.route_leg(
                &frame,
                &blockers,
                leg[0],
                leg[1],
                request.params.resolution,
                cancel,
            )?;
            let skip = usize::from(!route.is_empty());
            route.extend(points.into_iter().skip(skip));
        }

        tracing::debug!(
            request_id = request.id,
            legs = stops.len() - 1,
            points = route.len(),
            "path computed"
        );
        Ok(LinePath::new(route))
    }

    fn preprocess(
        &self,
        obstacles: &ObstacleSet,
        buffer: f64,
        stops: &[Point],
    ) -> Result<Vec<Polygon>, EngineError> {
        if !buffer.is_finite() || buffer < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "buffer must be zero or a positive number of meters, got {}",
                buffer
            )));
        }
        for polygon in obstacles.polygons() {
            polygon.validate()?;
        }
        if buffer == 0.0 {
            return Ok(obstacles.polygons().cloned().collect());
        }
        let frame = frame_for(stops, obstacles);
        Ok(buffer::prepare(&frame, obstacles, buffer)
            .iter()
            .map(|b| frame.polygon_to_geodetic(b.shape()))
            .collect())
    }
}
