//! Owns one map session and keeps the rendered layers in step with it.
//!
//! The synchronizer runs as a single task. Host commands and dispatcher
//! results are both folded into [`MapState`] on that task, and it is the only
//! place that writes to the renderer, so layer updates never interleave.

use super::events::MapEvent;
use super::ports::{MapLayer, MapRenderer};
use super::state::{
    waypoints_from_collection, waypoints_to_collection, FailurePolicy, MapState, ResultDisposition,
};
use crate::common::{AggregateRoot, DomainResult};
use crate::domains::geometry::{features, Projection};
use crate::domains::logger::DynLogger;
use crate::domains::path_planning::{
    ComputationDispatcher, PathEngine, PathResult, RequestId, RoutingParams,
};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynchronizerSettings {
    pub params: RoutingParams,
    pub failure_policy: FailurePolicy,
}

impl Default for SynchronizerSettings {
    fn default() -> Self {
        Self {
            params: RoutingParams::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Requests the host sends to a running synchronizer.
pub enum MapCommand {
    SetObstacles {
        obstacles: FeatureCollection,
        reply: oneshot::Sender<DomainResult<Option<RequestId>>>,
    },
    ModifyWaypoints {
        waypoints: FeatureCollection,
        reply: oneshot::Sender<DomainResult<Option<RequestId>>>,
    },
    PlaceWaypoints {
        waypoints: Option<FeatureCollection>,
        reply: oneshot::Sender<DomainResult<()>>,
    },
    DrawLayer {
        layer: MapLayer,
        features: Option<FeatureCollection>,
    },
    GetWayPoints {
        reply: oneshot::Sender<FeatureCollection>,
    },
    FitMap {
        padding: [f64; 4],
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<MapState>,
    },
    Shutdown,
}

pub struct MapSynchronizer {
    state: MapState,
    engine: Arc<dyn PathEngine>,
    dispatcher: ComputationDispatcher,
    renderer: Box<dyn MapRenderer>,
    projection: Arc<dyn Projection>,
    settings: SynchronizerSettings,
    logger: DynLogger,
    events: broadcast::Sender<MapEvent>,
}

impl MapSynchronizer {
    pub fn new(
        state: MapState,
        engine: Arc<dyn PathEngine>,
        dispatcher: ComputationDispatcher,
        renderer: Box<dyn MapRenderer>,
        projection: Arc<dyn Projection>,
        settings: SynchronizerSettings,
        logger: DynLogger,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state,
            engine,
            dispatcher,
            renderer,
            projection,
            settings,
            logger,
            events,
        }
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn settings(&self) -> &SynchronizerSettings {
        &self.settings
    }

    /// Sender side of the event stream; call `subscribe()` on it for a receiver.
    pub fn events(&self) -> broadcast::Sender<MapEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }

    /// The operator finished editing waypoints: store them and route again.
    pub fn handle_waypoints_changed(
        &mut self,
        waypoints: &FeatureCollection,
    ) -> DomainResult<Option<RequestId>> {
        let waypoints = waypoints_from_collection(waypoints)?;
        self.state.modify_waypoints(waypoints)?;
        self.render(MapLayer::WayPoints, &waypoints_to_collection(&self.state.waypoints));
        let request_id = self.reroute()?;
        self.publish();
        Ok(request_id)
    }

    /// Draw waypoints without routing between them.
    pub fn place_waypoints(&mut self, waypoints: Option<&FeatureCollection>) -> DomainResult<()> {
        let waypoints = match waypoints {
            Some(fc) => waypoints_from_collection(fc)?,
            None => Vec::new(),
        };
        self.state.place_waypoints(waypoints)?;
        self.render(MapLayer::WayPoints, &waypoints_to_collection(&self.state.waypoints));
        self.publish();
        Ok(())
    }

    /// Replace the obstacles, redraw them with their buffered outline and
    /// route again when there is something to route between.
    pub fn handle_obstacles_changed(
        &mut self,
        obstacles: &FeatureCollection,
    ) -> DomainResult<Option<RequestId>> {
        let obstacles = features::obstacles_from_collection(obstacles)?;
        let buffer = self.settings.params.buffer;
        let engine = Arc::clone(&self.engine);
        let stops = self.state.waypoint_points();
        let preprocessed = match catch_unwind(AssertUnwindSafe(|| {
            engine.preprocess(&obstacles, buffer, &stops)
        })) {
            Ok(Ok(polygons)) => polygons,
            Ok(Err(e)) => {
                self.logger
                    .warn(&format!("could not buffer obstacles, drawing them as-is: {}", e));
                obstacles.polygons().cloned().collect()
            }
            Err(_) => {
                tracing::error!("obstacle buffering panicked");
                self.logger
                    .warn("could not buffer obstacles, drawing them as-is: internal error");
                obstacles.polygons().cloned().collect()
            }
        };

        self.state.update_obstacles(obstacles, preprocessed)?;
        self.render(
            MapLayer::Obstacles,
            &features::obstacles_to_collection(&self.state.obstacles),
        );
        self.render(
            MapLayer::Preprocessed,
            &features::polygons_to_collection(&self.state.preprocessed),
        );

        let request_id = if self.state.waypoints.len() >= 2 {
            self.reroute()?
        } else {
            None
        };
        self.publish();
        Ok(request_id)
    }

    /// Layers the host draws directly. They never influence routing.
    pub fn draw_layer(&mut self, layer: MapLayer, fc: Option<FeatureCollection>) {
        match layer {
            MapLayer::Postprocessed => self.state.postprocessed = fc.clone(),
            MapLayer::Intersections => self.state.intersections = fc.clone(),
            _ => {}
        }
        let fc = fc.unwrap_or_else(|| features::collection(Vec::new()));
        self.render(layer, &fc);
    }

    pub fn handle_result(&mut self, result: PathResult) -> DomainResult<ResultDisposition> {
        let request_id = result.request_id;
        let disposition = self
            .state
            .accept_result(&result, self.settings.failure_policy)?;
        match &disposition {
            ResultDisposition::Applied => {
                if let Some(path) = &self.state.displayed_path {
                    let fc = features::collection(vec![features::line_to_feature(path)]);
                    self.render(MapLayer::Path, &fc);
                }
                tracing::debug!(request_id, "path layer updated");
            }
            ResultDisposition::Failed {
                reason,
                path_cleared,
            } => {
                if *path_cleared {
                    self.render(MapLayer::Path, &features::collection(Vec::new()));
                }
                self.logger
                    .warn(&format!("route {} failed: {}", request_id, reason));
            }
            ResultDisposition::Stale => {
                tracing::debug!(
                    request_id,
                    latest = self.state.latest_request_id,
                    "ignoring result for superseded request"
                );
            }
            ResultDisposition::Ignored => {}
        }
        self.publish();
        Ok(disposition)
    }

    /// Current waypoints as a geodetic feature collection.
    pub fn get_way_points(&self) -> FeatureCollection {
        waypoints_to_collection(&self.state.waypoints)
    }

    /// Fit the view to the obstacle layer. Returns `false` when there is nothing to fit.
    pub fn fit_map(&mut self, padding: [f64; 4]) -> bool {
        let obstacles = features::to_display_collection(
            &features::obstacles_to_collection(&self.state.obstacles),
            self.projection.as_ref(),
        );
        match features::collection_extent(&obstacles) {
            Some(extent) => {
                self.renderer.fit_view(extent, padding);
                true
            }
            None => false,
        }
    }

    fn reroute(&mut self) -> DomainResult<Option<RequestId>> {
        match self.state.request_route(self.settings.params)? {
            Some(request) => {
                let request_id = request.id;
                self.dispatcher.submit(request);
                Ok(Some(request_id))
            }
            None => {
                self.render(MapLayer::Path, &features::collection(Vec::new()));
                Ok(None)
            }
        }
    }

    fn render(&mut self, layer: MapLayer, fc: &FeatureCollection) {
        let display = features::to_display_collection(fc, self.projection.as_ref());
        self.renderer.set_layer_features(layer, display);
    }

    fn publish(&mut self) {
        for event in self.state.take_uncommitted_events() {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    /// Returns `false` once the session should stop.
    pub fn handle_command(&mut self, command: MapCommand) -> bool {
        match command {
            MapCommand::SetObstacles { obstacles, reply } => {
                let result = self.handle_obstacles_changed(&obstacles);
                if let Err(e) = &result {
                    tracing::error!("Failed to update obstacles: {}", e);
                }
                let _ = reply.send(result);
            }
            MapCommand::ModifyWaypoints { waypoints, reply } => {
                let result = self.handle_waypoints_changed(&waypoints);
                if let Err(e) = &result {
                    tracing::error!("Failed to apply waypoint edit: {}", e);
                }
                let _ = reply.send(result);
            }
            MapCommand::PlaceWaypoints { waypoints, reply } => {
                let _ = reply.send(self.place_waypoints(waypoints.as_ref()));
            }
            MapCommand::DrawLayer { layer, features } => self.draw_layer(layer, features),
            MapCommand::GetWayPoints { reply } => {
                let _ = reply.send(self.get_way_points());
            }
            MapCommand::FitMap { padding, reply } => {
                let _ = reply.send(self.fit_map(padding));
            }
            MapCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }
            MapCommand::Shutdown => return false,
        }
        true
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<MapCommand>,
        mut results: mpsc::UnboundedReceiver<PathResult>,
    ) {
        tracing::info!(session = %self.state.id, "map session started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => break,
                },
                Some(result) = results.recv() => {
                    if let Err(e) = self.handle_result(result) {
                        tracing::error!("Failed to apply path result: {}", e);
                    }
                }
            }
        }
        tracing::info!(session = %self.state.id, version = self.state.version(), "map session stopped");
    }
}
