//! Universe ingestion
//!
//! Channel data arrives per universe from whatever network layer is in use.
//! The [`UniverseRouter`] hands each buffer to the layers that map it, and
//! the [`IngestWorker`] does so off a queue on its own thread.

pub mod router;
pub mod worker;

pub use router::{UniverseRouter, UniverseStats};
pub use worker::{IngestConfig, IngestStats, IngestWorker, UniverseSender};

/// Channels in one universe
pub const UNIVERSE_SIZE: usize = lumachain_core::UNIVERSE_CHANNELS;

/// One universe's channel data as received from the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseFrame {
    /// Universe id
    pub universe: u16,
    /// Channel values, channel 1 first
    pub data: Vec<u8>,
}

impl UniverseFrame {
    /// Wrap one universe's channel buffer
    pub fn new(universe: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            universe,
            data: data.into(),
        }
    }
}
