//! Rig configuration file
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [[controllers]]
//! name = "bar"
//! protocol = "apa102"
//! frame_rate_hz = 30.0
//!
//! [[controllers.fixtures]]
//! pixels = 8
//!
//! [[controllers.fixtures.layers]]
//! mode = "overwrite"
//! fill = [255, 0, 0, 64]
//!
//! [[controllers.fixtures.layers]]
//! mappings = [{ universe = 1, pixels = 8, channels_per_pixel = 3, start_index = 0 }]
//! ```

use anyhow::{Context, Result};
use lumachain_core::{BlendMode, ChannelLayout, ChannelMapping, Pixel, Protocol};
use lumachain_render::PostAmble;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::level_filters::LevelFilter;

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Colored console output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }
}

/// Whole-rig configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub log: LogConfig,
    pub controllers: Vec<ControllerConfig>,
}

impl RigConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config file: {:?}", path))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse rig configuration")
    }
}

/// One output line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub name: String,
    pub protocol: Protocol,
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: f64,
    #[serde(default)]
    pub post_amble: PostAmble,
    #[serde(default)]
    pub fixtures: Vec<FixtureConfig>,
}

fn default_frame_rate() -> f64 {
    30.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureConfig {
    #[serde(default)]
    pub name: String,
    pub pixels: usize,
    #[serde(default = "full_brightness")]
    pub brightness: u8,
    /// Protocol the fixture is wired for; must match its controller
    #[serde(default)]
    pub protocol: Option<Protocol>,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

fn full_brightness() -> u8 {
    255
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub mode: BlendMode,
    /// Initial colour as `[a, r, g, b]`
    pub fill: Option<[u8; 4]>,
    pub mappings: Vec<MappingConfig>,
}

impl LayerConfig {
    pub fn fill_pixel(&self) -> Option<Pixel> {
        self.fill.map(Pixel::from_argb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    pub universe: u16,
    pub pixels: usize,
    pub channels_per_pixel: u8,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub start_channel: usize,
}

impl MappingConfig {
    pub fn to_mapping(&self) -> lumachain_core::Result<ChannelMapping> {
        let layout = ChannelLayout::from_channels_per_pixel(self.channels_per_pixel)?;
        Ok(ChannelMapping::new(self.universe, self.pixels, layout, self.start_index)
            .with_start_channel(self.start_channel))
    }
}
