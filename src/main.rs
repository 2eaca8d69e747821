use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use waypoint_router::adapters::outbound::{
    init_buffered_logger, init_combined_logger, FilesystemDataSource, GeoJsonFileRenderer,
};
use waypoint_router::application::MapService;
use waypoint_router::domains::map::{MapDataSource, MapEvent};
use waypoint_router::domains::DynLogger;
use waypoint_router::Config;

const CONFIG_FILE: &str = "config.toml";
const OUTPUT_DIR: &str = "map-output";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // `set_global_default` leaves the `log` facade free for fast_log.
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .finish(),
    )?;

    info!("Starting waypoint router");

    let config = if Path::new(CONFIG_FILE).exists() {
        Config::from_file(CONFIG_FILE).await?
    } else {
        warn!("{} not found, using defaults", CONFIG_FILE);
        Config::default()
    };
    info!(
        resolution = config.routing.resolution,
        buffer = config.routing.buffer,
        "Configuration loaded"
    );

    let mut logger = init_combined_logger(config.logging.file.as_deref(), config.logging.level);
    if config.logging.buffer_capacity > 0 {
        logger = init_buffered_logger(logger, config.logging.buffer_capacity) as DynLogger;
    }

    let data_source = FilesystemDataSource::new(None);
    let obstacles = data_source.load_feature_collection("obstacles.geojson")?;
    let waypoints = data_source.load_feature_collection("waypoints.geojson")?;
    info!(
        obstacles = obstacles.features.len(),
        waypoints = waypoints.features.len(),
        "Loaded map from {}",
        data_source.base().display()
    );

    let renderer = GeoJsonFileRenderer::new(OUTPUT_DIR)?;
    let map = MapService::start(&config, Box::new(renderer), Arc::clone(&logger))?;
    let mut events = map.subscribe();

    map.draw_obstacles(obstacles).await?;
    map.draw_way_points(Some(waypoints.clone())).await?;
    map.fit_map(None).await?;
    let request_id = map.modify_waypoints(waypoints).await?;
    info!(?request_id, "Route requested");

    let wait = config.routing.compute_timeout() + Duration::from_secs(1);
    let outcome = tokio::time::timeout(wait, async {
        loop {
            match events.recv().await {
                Ok(event @ MapEvent::PathUpdated { .. }) | Ok(event @ MapEvent::RouteFailed { .. }) => {
                    return Some(event)
                }
                Ok(_) => continue,
                Err(e) => {
                    error!("Event stream ended: {}", e);
                    return None;
                }
            }
        }
    })
    .await;

    match outcome {
        Ok(Some(MapEvent::PathUpdated { path, .. })) => {
            logger.info(&format!("Route with {} points written to {}", path.len(), OUTPUT_DIR));
        }
        Ok(Some(MapEvent::RouteFailed { reason, .. })) => {
            logger.warn(&format!("No route: {}", reason));
        }
        Ok(_) => {}
        Err(_) => error!("No routing result within {:?}", wait),
    }

    map.shutdown().await?;
    info!("Waypoint router finished");
    Ok(())
}
