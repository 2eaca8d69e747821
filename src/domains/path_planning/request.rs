use crate::domains::geometry::{LinePath, ObstacleSet, Point};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Identity of a routing attempt, strictly increasing per map session.
pub type RequestId = u64;

pub const DEFAULT_RESOLUTION: f64 = 1000.0;
pub const DEFAULT_BUFFER: f64 = 0.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no path found")]
    NoPathFound,

    #[error("computation cancelled")]
    Cancelled,
}

impl From<EngineError> for crate::common::DomainError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidParameter(reason) => Self::InvalidParameter { reason },
            EngineError::NoPathFound => Self::NoPathFound,
            EngineError::Cancelled => Self::InfrastructureError("computation cancelled".to_string()),
        }
    }
}

impl From<crate::common::DomainError> for EngineError {
    fn from(e: crate::common::DomainError) -> Self {
        match e {
            crate::common::DomainError::InvalidParameter { reason } => Self::InvalidParameter(reason),
            crate::common::DomainError::NoPathFound => Self::NoPathFound,
            other => Self::InvalidParameter(other.to_string()),
        }
    }
}

/// Grid cell size and obstacle margin, both in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingParams {
    pub resolution: f64,
    pub buffer: f64,
}

impl Default for RoutingParams {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            buffer: DEFAULT_BUFFER,
        }
    }
}

impl RoutingParams {
    pub fn new(resolution: f64, buffer: f64) -> Result<Self, EngineError> {
        let params = Self { resolution, buffer };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "resolution must be a positive number of meters, got {}",
                self.resolution
            )));
        }
        if !self.buffer.is_finite() || self.buffer < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "buffer must be zero or a positive number of meters, got {}",
                self.buffer
            )));
        }
        Ok(())
    }
}

/// One routing attempt. Immutable once built and consumed by exactly one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub id: RequestId,
    pub start: Point,
    pub end: Point,
    pub via: Vec<Point>,
    pub obstacles: ObstacleSet,
    pub params: RoutingParams,
}

impl PathRequest {
    pub fn new(
        id: RequestId,
        start: Point,
        end: Point,
        obstacles: ObstacleSet,
        params: RoutingParams,
    ) -> Self {
        Self {
            id,
            start,
            end,
            via: Vec::new(),
            obstacles,
            params,
        }
    }

    pub fn with_via(mut self, via: Vec<Point>) -> Self {
        self.via = via;
        self
    }

    /// Build a request from an ordered waypoint list; `None` with fewer than two points.
    pub fn from_waypoints(
        id: RequestId,
        waypoints: &[Point],
        obstacles: ObstacleSet,
        params: RoutingParams,
    ) -> Option<Self> {
        match waypoints {
            [start, via @ .., end] => {
                Some(Self::new(id, *start, *end, obstacles, params).with_via(via.to_vec()))
            }
            _ => None,
        }
    }

    /// Start, via points and end in travel order.
    pub fn stops(&self) -> Vec<Point> {
        let mut stops = Vec::with_capacity(self.via.len() + 2);
        stops.push(self.start);
        stops.extend(self.via.iter().copied());
        stops.push(self.end);
        stops
    }

    /// Checks everything that can be rejected without running a search.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.params.validate()?;
        for stop in self.stops() {
            stop.validate()?;
        }
        for (index, polygon) in self.obstacles.polygons().enumerate() {
            if let Err(e) = polygon.validate() {
                return Err(match EngineError::from(e) {
                    EngineError::InvalidParameter(reason) => {
                        EngineError::InvalidParameter(format!("obstacle {}: {}", index, reason))
                    }
                    other => other,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathOutcome {
    Found(LinePath),
    NotFound,
    Cancelled,
    Failed(String),
}

/// Terminal outcome of one request, tagged with the request it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub request_id: RequestId,
    pub outcome: PathOutcome,
}

impl PathResult {
    pub fn from_engine(request_id: RequestId, result: Result<LinePath, EngineError>) -> Self {
        let outcome = match result {
            Ok(path) => PathOutcome::Found(path),
            Err(EngineError::NoPathFound) => PathOutcome::NotFound,
            Err(EngineError::Cancelled) => PathOutcome::Cancelled,
            Err(e @ EngineError::InvalidParameter(_)) => PathOutcome::Failed(e.to_string()),
        };
        Self {
            request_id,
            outcome,
        }
    }

    pub fn failed(request_id: RequestId, reason: impl Into<String>) -> Self {
        Self {
            request_id,
            outcome: PathOutcome::Failed(reason.into()),
        }
    }
}

/// Cooperative cancellation flag shared between the dispatcher and a running computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn check(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
