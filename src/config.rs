use crate::common::{ApplicationError, ApplicationResult};
use crate::domains::logger::LogLevel;
use crate::domains::map::{FailurePolicy, SynchronizerSettings};
use crate::domains::path_planning::engine::{DEFAULT_BBOX_PADDING, DEFAULT_MAX_GRID_CELLS};
use crate::domains::path_planning::{RoutingParams, DEFAULT_BUFFER, DEFAULT_RESOLUTION};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub routing: RoutingConfig,
    pub map: MapConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Grid cell size in meters.
    pub resolution: f64,
    /// Obstacle margin in meters.
    pub buffer: f64,
    pub compute_timeout_secs: u64,
    pub max_grid_cells: usize,
    /// Grid margin around the routing area as a fraction of its size.
    pub bbox_padding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub fit_padding: Vec<f64>,
    pub failure_policy: FailurePolicy,
    /// Command queue length of a map session.
    pub command_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: LogLevel,
    /// Queue length of the buffered notification logger; 0 logs synchronously.
    pub buffer_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            buffer: DEFAULT_BUFFER,
            compute_timeout_secs: 30,
            max_grid_cells: DEFAULT_MAX_GRID_CELLS,
            bbox_padding: DEFAULT_BBOX_PADDING,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fit_padding: vec![10.0, 10.0, 10.0, 10.0],
            failure_policy: FailurePolicy::ClearPath,
            command_capacity: 64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: Some("./waypoint-router.log".to_string()),
            level: LogLevel::Info,
            buffer_capacity: 1024,
        }
    }
}

impl RoutingConfig {
    pub fn params(&self) -> RoutingParams {
        RoutingParams {
            resolution: self.resolution,
            buffer: self.buffer,
        }
    }

    pub fn compute_timeout(&self) -> Duration {
        Duration::from_secs(self.compute_timeout_secs)
    }
}

impl MapConfig {
    /// Padding as passed to the renderer. Call after `Config::validate`.
    pub fn padding(&self) -> [f64; 4] {
        let mut padding = [10.0; 4];
        for (slot, value) in padding.iter_mut().zip(&self.fit_padding) {
            *slot = *value;
        }
        padding
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> ApplicationResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ApplicationResult<Self> {
        let config: Config = toml::from_str(content).context("parsing configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> SynchronizerSettings {
        SynchronizerSettings {
            params: self.routing.params(),
            failure_policy: self.map.failure_policy,
        }
    }

    pub fn validate(&self) -> ApplicationResult<()> {
        let fail = |msg: String| Err(ApplicationError::Configuration(anyhow!(msg)));
        let routing = &self.routing;
        if let Err(e) = routing.params().validate() {
            return fail(format!("routing: {}", e));
        }
        if routing.compute_timeout_secs == 0 {
            return fail("routing: compute_timeout_secs must be greater than zero".into());
        }
        if routing.max_grid_cells == 0 {
            return fail("routing: max_grid_cells must be greater than zero".into());
        }
        if !routing.bbox_padding.is_finite() || routing.bbox_padding < 0.0 {
            return fail(format!(
                "routing: bbox_padding must be zero or positive, got {}",
                routing.bbox_padding
            ));
        }
        if self.map.fit_padding.len() != 4
            || self.map.fit_padding.iter().any(|p| !p.is_finite() || *p < 0.0)
        {
            return fail(format!(
                "map: fit_padding needs four non-negative values, got {:?}",
                self.map.fit_padding
            ));
        }
        if self.map.command_capacity == 0 {
            return fail("map: command_capacity must be greater than zero".into());
        }
        Ok(())
    }
}
