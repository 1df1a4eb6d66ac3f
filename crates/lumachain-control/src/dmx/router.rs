//! Universe to layer routing

use lumachain_core::{Fixture, IngestReport, Layer};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::UniverseFrame;

/// Per-universe delivery counters
#[derive(Debug, Clone, Copy)]
pub struct UniverseStats {
    /// Frames delivered for this universe
    pub frames: u64,
    /// Mapping writes applied
    pub applied: u64,
    /// Mapping writes skipped because the frame was too short
    pub skipped: u64,
    /// When the last frame arrived
    pub last_seen: Instant,
}

/// Delivers universe channel buffers to every layer that maps them
#[derive(Debug, Default)]
pub struct UniverseRouter {
    layers: RwLock<Vec<Arc<Layer>>>,
    stats: Mutex<HashMap<u16, UniverseStats>>,
}

impl UniverseRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Route frames to this layer. Registering the same layer twice is a
    /// no-op.
    pub fn register(&self, layer: &Arc<Layer>) {
        let mut layers = self.layers.write();
        if !layers.iter().any(|l| Arc::ptr_eq(l, layer)) {
            layers.push(Arc::clone(layer));
        }
    }

    /// Register every layer of a fixture that has at least one mapping
    pub fn register_fixture(&self, fixture: &Fixture) {
        for layer in fixture.layers() {
            if !layer.mappings().is_empty() {
                self.register(layer);
            }
        }
    }

    /// Stop routing frames to this layer
    pub fn unregister(&self, layer: &Arc<Layer>) -> bool {
        let mut layers = self.layers.write();
        let before = layers.len();
        layers.retain(|l| !Arc::ptr_eq(l, layer));
        layers.len() != before
    }

    /// Number of registered layers
    pub fn len(&self) -> usize {
        self.layers.read().len()
    }

    /// Whether no layers are registered
    pub fn is_empty(&self) -> bool {
        self.layers.read().is_empty()
    }

    /// Get all universes that registered layers listen to
    pub fn used_universes(&self) -> Vec<u16> {
        let mut universes: Vec<u16> = self
            .layers
            .read()
            .iter()
            .flat_map(|layer| layer.mappings())
            .map(|mapping| mapping.universe)
            .collect();
        universes.sort_unstable();
        universes.dedup();
        universes
    }

    /// Apply one universe's channel data to every listening layer.
    ///
    /// Each mapping commits atomically; short frames are skipped per mapping
    /// and counted in the returned report.
    pub fn dispatch(&self, universe: u16, data: &[u8]) -> IngestReport {
        let mut report = IngestReport::default();
        for layer in self.layers.read().iter() {
            report.merge(layer.ingest(universe, data));
        }

        if report.applied == 0 && report.skipped == 0 {
            tracing::trace!("No layer listens to universe {}", universe);
        }
        if report.skipped > 0 {
            tracing::debug!(
                "Universe {}: {} mapping(s) skipped on short frame ({} channels)",
                universe,
                report.skipped,
                data.len()
            );
        }

        let mut stats = self.stats.lock();
        let entry = stats.entry(universe).or_insert(UniverseStats {
            frames: 0,
            applied: 0,
            skipped: 0,
            last_seen: Instant::now(),
        });
        entry.frames += 1;
        entry.applied += report.applied as u64;
        entry.skipped += report.skipped as u64;
        entry.last_seen = Instant::now();

        report
    }

    /// Dispatch a frame handed over by the network layer
    pub fn dispatch_frame(&self, frame: &UniverseFrame) -> IngestReport {
        self.dispatch(frame.universe, &frame.data)
    }

    /// Delivery counters for a universe
    pub fn stats(&self, universe: u16) -> Option<UniverseStats> {
        self.stats.lock().get(&universe).copied()
    }
}
