use crate::common::{DomainError, DomainResult};
use crate::domains::map::MapDataSource;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DATA_DIR_ENV: &str = "WAYPOINT_ROUTER_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "resources/maps";

/// Reads `<base>/geojson/<name>`. The base directory comes from the
/// constructor, then `WAYPOINT_ROUTER_DATA_DIR`, then `resources/maps`.
pub struct FilesystemDataSource {
    base: PathBuf,
}

impl FilesystemDataSource {
    pub fn new(base: Option<PathBuf>) -> Self {
        let base = base
            .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn geojson_path(&self, name: &str) -> DomainResult<PathBuf> {
        let relative = Path::new(name);
        if relative.is_absolute() || relative.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(DomainError::invalid(format!(
                "map file name must stay inside the data directory: {}",
                name
            )));
        }
        Ok(self.base.join("geojson").join(relative))
    }

    /// Write a GeoJSON document, creating the directory when needed.
    pub fn save_geojson(&self, name: &str, content: &str) -> DomainResult<()> {
        let path = self.geojson_path(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DomainError::InfrastructureError(format!("{}: {}", parent.display(), e))
            })?;
        }
        fs::write(&path, content)
            .map_err(|e| DomainError::InfrastructureError(format!("{}: {}", path.display(), e)))
    }
}

impl MapDataSource for FilesystemDataSource {
    fn load_geojson(&self, name: &str) -> DomainResult<String> {
        let path = self.geojson_path(name)?;
        fs::read_to_string(&path)
            .map_err(|e| DomainError::InfrastructureError(format!("{}: {}", path.display(), e)))
    }
}
