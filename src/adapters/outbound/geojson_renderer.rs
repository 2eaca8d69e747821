use crate::domains::geometry::Extent;
use crate::domains::map::{MapLayer, MapRenderer};
use geojson::FeatureCollection;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ViewFile<'a> {
    extent: &'a Extent,
    padding: [f64; 4],
}

/// Writes each layer to `<dir>/<layer>.geojson` and the fitted view to
/// `<dir>/view.json`. Used by the demo binary in place of a map canvas.
pub struct GeoJsonFileRenderer {
    dir: PathBuf,
}

impl GeoJsonFileRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn layer_path(&self, layer: MapLayer) -> PathBuf {
        self.dir.join(format!("{}.geojson", layer.name()))
    }

    fn write(&self, path: &Path, content: Result<String, serde_json::Error>) {
        let result = content
            .map_err(|e| e.to_string())
            .and_then(|s| fs::write(path, s).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::error!("Failed to write {}: {}", path.display(), e);
        }
    }
}

impl MapRenderer for GeoJsonFileRenderer {
    fn set_layer_features(&mut self, layer: MapLayer, features: FeatureCollection) {
        let path = self.layer_path(layer);
        self.write(&path, serde_json::to_string_pretty(&features));
    }

    fn fit_view(&mut self, extent: Extent, padding: [f64; 4]) {
        let path = self.dir.join("view.json");
        self.write(
            &path,
            serde_json::to_string_pretty(&ViewFile {
                extent: &extent,
                padding,
            }),
        );
    }
}
