//! Builds controllers, fixtures and layers from a [`RigConfig`]

use anyhow::{Context, Result};
use lumachain_control::UniverseRouter;
use lumachain_core::Fixture;
use lumachain_render::{Controller, DriverConfig, LatestFrameSink};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::config::{ControllerConfig, FixtureConfig, RigConfig};

/// A controller plus the sink it writes into
pub struct RigOutput {
    pub controller: Arc<Mutex<Controller>>,
    pub sink: LatestFrameSink,
    pub driver: DriverConfig,
}

/// Everything a config file describes, wired together and stopped
pub struct Rig {
    outputs: Vec<RigOutput>,
    router: Arc<UniverseRouter>,
}

impl Rig {
    /// Build every controller, lay out its chain and register mapped layers.
    ///
    /// Any configuration error (bad mapping, protocol mismatch) aborts the
    /// build.
    pub fn build(config: &RigConfig) -> Result<Self> {
        let router = Arc::new(UniverseRouter::new());
        let mut outputs = Vec::with_capacity(config.controllers.len());

        for controller_config in &config.controllers {
            let output = build_output(controller_config, &router)
                .with_context(|| format!("Controller '{}'", controller_config.name))?;
            outputs.push(output);
        }

        info!(
            "Rig ready: {} controller(s), universes {:?}",
            outputs.len(),
            router.used_universes()
        );
        Ok(Self { outputs, router })
    }

    pub fn outputs(&self) -> &[RigOutput] {
        &self.outputs
    }

    pub fn router(&self) -> &Arc<UniverseRouter> {
        &self.router
    }

    /// Start every controller
    pub fn start(&self) -> Result<()> {
        for output in &self.outputs {
            output.controller.lock().start()?;
        }
        Ok(())
    }

    pub fn stop(&self) {
        for output in &self.outputs {
            output.controller.lock().stop();
        }
    }

    /// Transmit one frame on every controller. Returns the encoded frames
    /// in controller order.
    pub fn show(&self) -> Result<Vec<Vec<u8>>> {
        let mut frames = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let mut controller = output.controller.lock();
            controller
                .show()
                .with_context(|| format!("Controller '{}'", controller.name()))?;
            frames.push(output.sink.last_frame().unwrap_or_default());
        }
        Ok(frames)
    }
}

fn build_output(config: &ControllerConfig, router: &UniverseRouter) -> Result<RigOutput> {
    let sink = LatestFrameSink::new();
    let mut controller = Controller::new(config.name.clone(), config.protocol, sink.clone())
        .with_post_amble(config.post_amble);

    for (index, fixture_config) in config.fixtures.iter().enumerate() {
        let fixture = build_fixture(fixture_config, index)?;
        router.register_fixture(&fixture);
        controller.add_fixture(fixture)?;
        controller.recompute_chain();
    }

    Ok(RigOutput {
        controller: Arc::new(Mutex::new(controller)),
        sink,
        driver: DriverConfig::from_frame_rate(config.frame_rate_hz),
    })
}

fn build_fixture(config: &FixtureConfig, index: usize) -> Result<Fixture> {
    let name = if config.name.is_empty() {
        format!("fixture-{}", index)
    } else {
        config.name.clone()
    };
    let mut fixture = Fixture::new(config.pixels)
        .with_name(name.clone())
        .with_brightness(config.brightness);
    if let Some(protocol) = config.protocol {
        fixture = fixture.with_protocol(protocol);
    }

    for (layer_index, layer_config) in config.layers.iter().enumerate() {
        let layer = fixture.add_layer();
        layer.set_mode(layer_config.mode);
        if let Some(pixel) = layer_config.fill_pixel() {
            layer.fill(pixel);
        }
        for mapping_config in &layer_config.mappings {
            mapping_config
                .to_mapping()
                .and_then(|mapping| layer.add_mapping(mapping))
                .with_context(|| format!("Fixture '{}' layer {}", name, layer_index))?;
        }
    }

    Ok(fixture)
}

/// Test pattern for one universe: a channel ramp that shifts each step
pub fn ramp_universe(step: usize, channels: usize) -> Vec<u8> {
    (0..channels)
        .map(|channel| ((channel + step * 8) % 256) as u8)
        .collect()
}
