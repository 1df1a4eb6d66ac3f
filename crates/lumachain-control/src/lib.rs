//! Lumachain Control - Universe ingestion
//!
//! Routes incoming per-universe channel data to the layers whose mappings
//! reference it, either inline via [`UniverseRouter::dispatch`] or through a
//! queued [`IngestWorker`] thread.
//!
//! ## Example
//!
//! ```rust
//! use lumachain_control::UniverseRouter;
//! use lumachain_core::{ChannelLayout, ChannelMapping, Fixture, Pixel};
//!
//! let mut fixture = Fixture::new(1);
//! let layer = fixture.add_layer();
//! layer.add_mapping(ChannelMapping::new(7, 1, ChannelLayout::Rgb, 0)).unwrap();
//!
//! let router = UniverseRouter::new();
//! router.register_fixture(&fixture);
//! router.dispatch(7, &[9, 8, 7]);
//!
//! assert_eq!(layer.snapshot()[0], Pixel::new(0, 9, 8, 7));
//! ```

pub mod dmx;
pub mod error;

pub use dmx::{
    IngestConfig, IngestStats, IngestWorker, UniverseFrame, UniverseRouter, UniverseSender,
    UniverseStats, UNIVERSE_SIZE,
};
pub use error::{ControlError, Result};
