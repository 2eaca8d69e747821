use crate::common::{ApplicationError, ApplicationResult};
use crate::config::Config;
use crate::domains::geometry::{features, Projection, WebMercator};
use crate::domains::logger::DynLogger;
use crate::domains::map::{MapCommand, MapEvent, MapLayer, MapRenderer, MapState, MapSynchronizer};
use crate::domains::path_planning::{ComputationDispatcher, GridPathEngine, PathEngine, RequestId};
use geojson::{Feature, FeatureCollection};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Host-facing handle to one map session. Cloning is cheap; all clones talk
/// to the same session task. All GeoJSON in and out is geodetic (EPSG:4326).
#[derive(Clone)]
pub struct MapService {
    commands: mpsc::Sender<MapCommand>,
    events: broadcast::Sender<MapEvent>,
    fit_padding: [f64; 4],
}

impl MapService {
    /// Start a session with the grid engine and a Web Mercator canvas.
    pub fn start(
        config: &Config,
        renderer: Box<dyn MapRenderer>,
        logger: DynLogger,
    ) -> ApplicationResult<Self> {
        let engine = GridPathEngine::new(config.routing.max_grid_cells, config.routing.bbox_padding);
        Self::start_with_engine(config, Arc::new(engine), renderer, Arc::new(WebMercator), logger)
    }

    pub fn start_with_engine(
        config: &Config,
        engine: Arc<dyn PathEngine>,
        renderer: Box<dyn MapRenderer>,
        projection: Arc<dyn Projection>,
        logger: DynLogger,
    ) -> ApplicationResult<Self> {
        config.validate()?;
        let (dispatcher, results) =
            ComputationDispatcher::new(Arc::clone(&engine), config.routing.compute_timeout())?;
        let synchronizer = MapSynchronizer::new(
            MapState::new(),
            engine,
            dispatcher,
            renderer,
            projection,
            config.settings(),
            logger,
        );
        let events = synchronizer.events();
        let (commands, command_receiver) = mpsc::channel(config.map.command_capacity);
        tokio::spawn(synchronizer.run(command_receiver, results));

        Ok(Self {
            commands,
            events,
            fit_padding: config.map.padding(),
        })
    }

    async fn send(&self, command: MapCommand) -> ApplicationResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|e| ApplicationError::SessionClosed(format!("Failed to send command: {}", e)))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> MapCommand,
    ) -> ApplicationResult<T> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response
            .await
            .map_err(|_| ApplicationError::SessionClosed("session dropped the reply".to_string()))
    }

    /// Replace the obstacles. Returns the id of the route request this
    /// triggered, if there are enough waypoints to route between.
    pub async fn draw_obstacles(
        &self,
        obstacles: FeatureCollection,
    ) -> ApplicationResult<Option<RequestId>> {
        Ok(self
            .request(|reply| MapCommand::SetObstacles { obstacles, reply })
            .await??)
    }

    pub async fn draw_preprocessed_geometry(
        &self,
        geometry: Option<FeatureCollection>,
    ) -> ApplicationResult<()> {
        self.draw_layer(MapLayer::Preprocessed, geometry).await
    }

    pub async fn draw_path(&self, path: Option<Feature>) -> ApplicationResult<()> {
        self.draw_layer(MapLayer::Path, path.map(|f| features::collection(vec![f])))
            .await
    }

    pub async fn draw_postprocessed_geometry(&self, path: Option<Feature>) -> ApplicationResult<()> {
        self.draw_layer(MapLayer::Postprocessed, path.map(|f| features::collection(vec![f])))
            .await
    }

    pub async fn draw_intersections(
        &self,
        intersections: Option<FeatureCollection>,
    ) -> ApplicationResult<()> {
        self.draw_layer(MapLayer::Intersections, intersections).await
    }

    /// Show waypoints without routing between them.
    pub async fn draw_way_points(
        &self,
        waypoints: Option<FeatureCollection>,
    ) -> ApplicationResult<()> {
        Ok(self
            .request(|reply| MapCommand::PlaceWaypoints { waypoints, reply })
            .await??)
    }

    pub async fn get_way_points(&self) -> ApplicationResult<FeatureCollection> {
        self.request(|reply| MapCommand::GetWayPoints { reply }).await
    }

    /// Fit the view to the obstacles; `None` uses the configured padding.
    pub async fn fit_map(&self, padding: Option<[f64; 4]>) -> ApplicationResult<bool> {
        let padding = padding.unwrap_or(self.fit_padding);
        self.request(|reply| MapCommand::FitMap { padding, reply }).await
    }

    /// Entry point for the waypoint drag interaction.
    pub async fn modify_waypoints(
        &self,
        waypoints: FeatureCollection,
    ) -> ApplicationResult<Option<RequestId>> {
        Ok(self
            .request(|reply| MapCommand::ModifyWaypoints { waypoints, reply })
            .await??)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ApplicationResult<MapState> {
        self.request(|reply| MapCommand::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) -> ApplicationResult<()> {
        self.send(MapCommand::Shutdown).await
    }

    async fn draw_layer(
        &self,
        layer: MapLayer,
        features: Option<FeatureCollection>,
    ) -> ApplicationResult<()> {
        self.send(MapCommand::DrawLayer { layer, features }).await
    }
}
