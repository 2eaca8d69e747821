use super::events::MapEvent;
use crate::common::{AggregateRoot, DomainError, DomainResult};
use crate::domains::geometry::{features, LinePath, ObstacleSet, Point, Polygon};
use crate::domains::path_planning::{PathOutcome, PathRequest, PathResult, RequestId, RoutingParams};
use chrono::Utc;
use geojson::{FeatureCollection, JsonObject};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointRole {
    Start,
    Via,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Point,
    pub role: WaypointRole,
    pub properties: Option<JsonObject>,
}

/// Read waypoints in feature order. The first feature is the start, the last
/// the end and everything in between a via point.
pub fn waypoints_from_collection(fc: &FeatureCollection) -> DomainResult<Vec<Waypoint>> {
    let last = fc.features.len().saturating_sub(1);
    fc.features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature.geometry.as_ref().ok_or_else(|| {
                DomainError::invalid(format!("waypoint feature {} has no geometry", index))
            })?;
            let role = match index {
                0 => WaypointRole::Start,
                i if i == last => WaypointRole::End,
                _ => WaypointRole::Via,
            };
            Ok(Waypoint {
                point: features::point_from_geometry(geometry)?,
                role,
                properties: feature.properties.clone(),
            })
        })
        .collect()
}

pub fn waypoints_to_collection(waypoints: &[Waypoint]) -> FeatureCollection {
    features::collection(
        waypoints
            .iter()
            .map(|w| features::feature(features::point_to_geometry(w.point), w.properties.clone()))
            .collect(),
    )
}

/// What to show when the current request ends without a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    ClearPath,
    KeepPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultDisposition {
    Applied,
    Failed { reason: String, path_cleared: bool },
    /// Answers a request that is no longer the latest one.
    Stale,
    Ignored,
}

/// Everything one map session knows. Geometry is kept in geodetic coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapState {
    pub id: String,
    pub obstacles: ObstacleSet,
    pub preprocessed: Vec<Polygon>,
    pub waypoints: Vec<Waypoint>,
    pub displayed_path: Option<LinePath>,
    pub postprocessed: Option<FeatureCollection>,
    pub intersections: Option<FeatureCollection>,
    pub latest_request_id: RequestId,
    pub pending_request: Option<RequestId>,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<MapEvent>,
}

impl Default for MapState {
    fn default() -> Self {
        Self::new()
    }
}

impl MapState {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            obstacles: ObstacleSet::default(),
            preprocessed: Vec::new(),
            waypoints: Vec::new(),
            displayed_path: None,
            postprocessed: None,
            intersections: None,
            latest_request_id: 0,
            pending_request: None,
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn waypoint_points(&self) -> Vec<Point> {
        self.waypoints.iter().map(|w| w.point).collect()
    }

    pub fn modify_waypoints(&mut self, waypoints: Vec<Waypoint>) -> DomainResult<()> {
        self.record(MapEvent::WaypointsModified {
            session_id: self.id.clone(),
            waypoints,
            timestamp: Utc::now(),
        })
    }

    pub fn place_waypoints(&mut self, waypoints: Vec<Waypoint>) -> DomainResult<()> {
        self.record(MapEvent::WaypointsPlaced {
            session_id: self.id.clone(),
            waypoints,
            timestamp: Utc::now(),
        })
    }

    pub fn update_obstacles(
        &mut self,
        obstacles: ObstacleSet,
        preprocessed: Vec<Polygon>,
    ) -> DomainResult<()> {
        self.record(MapEvent::ObstaclesUpdated {
            session_id: self.id.clone(),
            obstacles,
            preprocessed,
            timestamp: Utc::now(),
        })
    }

    /// Issue the next request for the current waypoints and obstacles.
    ///
    /// With fewer than two waypoints nothing can be routed: any displayed
    /// path and outstanding request are dropped and `None` is returned.
    pub fn request_route(&mut self, params: RoutingParams) -> DomainResult<Option<PathRequest>> {
        let points = self.waypoint_points();
        if points.len() < 2 {
            if self.pending_request.is_some() || self.displayed_path.is_some() {
                self.record(MapEvent::PathCleared {
                    session_id: self.id.clone(),
                    request_id: None,
                    timestamp: Utc::now(),
                })?;
            }
            return Ok(None);
        }

        let request_id = self.latest_request_id + 1;
        self.record(MapEvent::RouteRequested {
            session_id: self.id.clone(),
            request_id,
            timestamp: Utc::now(),
        })?;
        Ok(PathRequest::from_waypoints(
            request_id,
            &points,
            self.obstacles.clone(),
            params,
        ))
    }

    /// Fold a dispatcher result into the state if it answers the outstanding request.
    pub fn accept_result(
        &mut self,
        result: &PathResult,
        policy: FailurePolicy,
    ) -> DomainResult<ResultDisposition> {
        if self.pending_request != Some(result.request_id) {
            return Ok(ResultDisposition::Stale);
        }
        match &result.outcome {
            PathOutcome::Found(path) => {
                self.record(MapEvent::PathUpdated {
                    session_id: self.id.clone(),
                    request_id: result.request_id,
                    path: path.clone(),
                    timestamp: Utc::now(),
                })?;
                Ok(ResultDisposition::Applied)
            }
            PathOutcome::NotFound => self.route_failed(result.request_id, "no path found".into(), policy),
            PathOutcome::Failed(reason) => self.route_failed(result.request_id, reason.clone(), policy),
            PathOutcome::Cancelled => {
                self.pending_request = None;
                Ok(ResultDisposition::Ignored)
            }
        }
    }

    fn route_failed(
        &mut self,
        request_id: RequestId,
        reason: String,
        policy: FailurePolicy,
    ) -> DomainResult<ResultDisposition> {
        let path_cleared = policy == FailurePolicy::ClearPath;
        self.record(MapEvent::RouteFailed {
            session_id: self.id.clone(),
            request_id,
            reason: reason.clone(),
            path_cleared,
            timestamp: Utc::now(),
        })?;
        Ok(ResultDisposition::Failed {
            reason,
            path_cleared,
        })
    }
}

impl AggregateRoot for MapState {
    type Event = MapEvent;

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            MapEvent::WaypointsModified { waypoints, .. } => {
                self.waypoints = waypoints.clone();
            }
            MapEvent::WaypointsPlaced { waypoints, .. } => {
                self.waypoints = waypoints.clone();
                self.pending_request = None;
            }
            MapEvent::ObstaclesUpdated {
                obstacles,
                preprocessed,
                ..
            } => {
                self.obstacles = obstacles.clone();
                self.preprocessed = preprocessed.clone();
            }
            MapEvent::RouteRequested { request_id, .. } => {
                if *request_id <= self.latest_request_id {
                    return Err(DomainError::invalid(format!(
                        "request {} does not advance past {}",
                        request_id, self.latest_request_id
                    )));
                }
                self.latest_request_id = *request_id;
                self.pending_request = Some(*request_id);
            }
            MapEvent::PathUpdated { path, .. } => {
                self.displayed_path = Some(path.clone());
                self.pending_request = None;
            }
            MapEvent::PathCleared { request_id, .. } => {
                self.displayed_path = None;
                if request_id.is_none() || *request_id == self.pending_request {
                    self.pending_request = None;
                }
            }
            MapEvent::RouteFailed { path_cleared, .. } => {
                if *path_cleared {
                    self.displayed_path = None;
                }
                self.pending_request = None;
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.uncommitted_events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(lon: f64, lat: f64, role: WaypointRole) -> Waypoint {
        Waypoint {
            point: Point { lon, lat },
            role,
            properties: None,
        }
    }

    fn two_waypoints() -> Vec<Waypoint> {
        vec![
            waypoint(0.0, 0.0, WaypointRole::Start),
            waypoint(1.0, 1.0, WaypointRole::End),
        ]
    }

    #[test]
    fn request_ids_increase_per_session() {
        let mut state = MapState::with_id("s");
        state.modify_waypoints(two_waypoints()).unwrap();
        let first = state.request_route(RoutingParams::default()).unwrap().unwrap();
        let second = state.request_route(RoutingParams::default()).unwrap().unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(state.latest_request_id, 2);
        assert_eq!(state.pending_request, Some(2));
    }

    #[test]
    fn older_result_is_stale_once_a_newer_request_exists() {
        let mut state = MapState::with_id("s");
        state.modify_waypoints(two_waypoints()).unwrap();
        state.request_route(RoutingParams::default()).unwrap();
        state.request_route(RoutingParams::default()).unwrap();

        let old = PathResult::from_engine(1, Ok(LinePath::new(vec![Point { lon: 0.0, lat: 0.0 }])));
        let disposition = state.accept_result(&old, FailurePolicy::ClearPath).unwrap();
        assert_eq!(disposition, ResultDisposition::Stale);
        assert!(state.displayed_path.is_none());
    }

    #[test]
    fn keep_path_policy_leaves_previous_path() {
        let mut state = MapState::with_id("s");
        state.modify_waypoints(two_waypoints()).unwrap();
        let request = state.request_route(RoutingParams::default()).unwrap().unwrap();
        let path = LinePath::new(vec![request.start, request.end]);
        state
            .accept_result(&PathResult::from_engine(request.id, Ok(path.clone())), FailurePolicy::KeepPath)
            .unwrap();

        let request = state.request_route(RoutingParams::default()).unwrap().unwrap();
        let disposition = state
            .accept_result(&PathResult::failed(request.id, "boom"), FailurePolicy::KeepPath)
            .unwrap();
        assert_eq!(
            disposition,
            ResultDisposition::Failed {
                reason: "boom".into(),
                path_cleared: false
            }
        );
        assert_eq!(state.displayed_path, Some(path));
        assert_eq!(state.pending_request, None);
    }

    #[test]
    fn single_waypoint_drops_pending_request() {
        let mut state = MapState::with_id("s");
        state.modify_waypoints(two_waypoints()).unwrap();
        state.request_route(RoutingParams::default()).unwrap();
        state
            .modify_waypoints(vec![waypoint(0.0, 0.0, WaypointRole::Start)])
            .unwrap();
        assert!(state.request_route(RoutingParams::default()).unwrap().is_none());
        assert_eq!(state.pending_request, None);
        assert_eq!(state.latest_request_id, 1);
    }

    #[test]
    fn events_are_recorded_in_order() {
        let mut state = MapState::with_id("s");
        state.modify_waypoints(two_waypoints()).unwrap();
        state.request_route(RoutingParams::default()).unwrap();
        let kinds: Vec<_> = state
            .take_uncommitted_events()
            .iter()
            .map(|e| crate::common::DomainEvent::event_type(e))
            .collect();
        assert_eq!(kinds, vec!["WaypointsModified", "RouteRequested"]);
        assert!(state.uncommitted_events().is_empty());
        assert_eq!(state.version(), 2);
    }
}
