use crate::domains::geometry::Extent;
use crate::domains::map::{MapLayer, MapRenderer};
use geojson::FeatureCollection;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    pub layers: BTreeMap<MapLayer, FeatureCollection>,
    /// Every layer write in call order.
    pub calls: Vec<MapLayer>,
    pub fits: Vec<(Extent, [f64; 4])>,
}

/// Keeps the last content of every layer in memory. Clones share the same log,
/// so a test can hand one clone to the map session and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    log: Arc<Mutex<RenderLog>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RenderLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> RenderLog {
        self.lock().clone()
    }

    pub fn layer(&self, layer: MapLayer) -> Option<FeatureCollection> {
        self.lock().layers.get(&layer).cloned()
    }

    pub fn feature_count(&self, layer: MapLayer) -> usize {
        self.lock()
            .layers
            .get(&layer)
            .map_or(0, |fc| fc.features.len())
    }
}

impl MapRenderer for RecordingRenderer {
    fn set_layer_features(&mut self, layer: MapLayer, features: FeatureCollection) {
        let mut log = self.lock();
        log.calls.push(layer);
        log.layers.insert(layer, features);
    }

    fn fit_view(&mut self, extent: Extent, padding: [f64; 4]) {
        self.lock().fits.push((extent, padding));
    }
}
