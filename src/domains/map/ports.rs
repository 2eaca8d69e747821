use crate::common::DomainResult;
use crate::domains::geometry::{features, Extent};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vector layers of the map canvas, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapLayer {
    Preprocessed,
    Obstacles,
    Path,
    Postprocessed,
    WayPoints,
    Intersections,
}

impl MapLayer {
    pub const ALL: [MapLayer; 6] = [
        MapLayer::Preprocessed,
        MapLayer::Obstacles,
        MapLayer::Path,
        MapLayer::Postprocessed,
        MapLayer::WayPoints,
        MapLayer::Intersections,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MapLayer::Preprocessed => "preprocessed",
            MapLayer::Obstacles => "obstacles",
            MapLayer::Path => "path",
            MapLayer::Postprocessed => "postprocessed",
            MapLayer::WayPoints => "way_points",
            MapLayer::Intersections => "intersections",
        }
    }
}

impl fmt::Display for MapLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Port to the map canvas. Every call comes from the synchronizer task and
/// carries coordinates in the renderer's display projection.
pub trait MapRenderer: Send + 'static {
    /// Replace the content of `layer`. An empty collection clears it.
    fn set_layer_features(&mut self, layer: MapLayer, features: FeatureCollection);

    /// Fit the view to `extent` leaving `padding` pixels (top, right, bottom, left).
    fn fit_view(&mut self, extent: Extent, padding: [f64; 4]);
}

/// Port for reading map content (obstacles, waypoints) shipped as GeoJSON files.
pub trait MapDataSource: Send + Sync {
    fn load_geojson(&self, name: &str) -> DomainResult<String>;

    fn load_feature_collection(&self, name: &str) -> DomainResult<FeatureCollection> {
        features::parse_feature_collection(&self.load_geojson(name)?)
    }
}
