use super::state::Waypoint;
use crate::common::DomainEvent;
use crate::domains::geometry::{LinePath, ObstacleSet, Polygon};
use crate::domains::path_planning::RequestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    /// The operator finished dragging waypoints.
    WaypointsModified {
        session_id: String,
        waypoints: Vec<Waypoint>,
        timestamp: DateTime<Utc>,
    },
    /// The host drew waypoints directly; no route is requested.
    WaypointsPlaced {
        session_id: String,
        waypoints: Vec<Waypoint>,
        timestamp: DateTime<Utc>,
    },
    ObstaclesUpdated {
        session_id: String,
        obstacles: ObstacleSet,
        preprocessed: Vec<Polygon>,
        timestamp: DateTime<Utc>,
    },
    RouteRequested {
        session_id: String,
        request_id: RequestId,
        timestamp: DateTime<Utc>,
    },
    PathUpdated {
        session_id: String,
        request_id: RequestId,
        path: LinePath,
        timestamp: DateTime<Utc>,
    },
    PathCleared {
        session_id: String,
        request_id: Option<RequestId>,
        timestamp: DateTime<Utc>,
    },
    RouteFailed {
        session_id: String,
        request_id: RequestId,
        reason: String,
        path_cleared: bool,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for MapEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MapEvent::WaypointsModified { .. } => "WaypointsModified",
            MapEvent::WaypointsPlaced { .. } => "WaypointsPlaced",
            MapEvent::ObstaclesUpdated { .. } => "ObstaclesUpdated",
            MapEvent::RouteRequested { .. } => "RouteRequested",
            MapEvent::PathUpdated { .. } => "PathUpdated",
            MapEvent::PathCleared { .. } => "PathCleared",
            MapEvent::RouteFailed { .. } => "RouteFailed",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            MapEvent::WaypointsModified { session_id, .. }
            | MapEvent::WaypointsPlaced { session_id, .. }
            | MapEvent::ObstaclesUpdated { session_id, .. }
            | MapEvent::RouteRequested { session_id, .. }
            | MapEvent::PathUpdated { session_id, .. }
            | MapEvent::PathCleared { session_id, .. }
            | MapEvent::RouteFailed { session_id, .. } => session_id,
        }
    }

    fn event_version(&self) -> u64 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MapEvent::WaypointsModified { timestamp, .. }
            | MapEvent::WaypointsPlaced { timestamp, .. }
            | MapEvent::ObstaclesUpdated { timestamp, .. }
            | MapEvent::RouteRequested { timestamp, .. }
            | MapEvent::PathUpdated { timestamp, .. }
            | MapEvent::PathCleared { timestamp, .. }
            | MapEvent::RouteFailed { timestamp, .. } => *timestamp,
        }
    }
}
