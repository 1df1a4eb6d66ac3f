//! Lumachain Render - Chain assembly and LED wire output
//!
//! This crate turns composited fixtures into bytes on a wire:
//! - Protocol encoders (APA102, WS2812) with configurable post-amble
//! - Frame sinks: bit-banged two-wire, SPI, in-memory log or latest frame
//! - [`Controller`]: chain layout and compose-encode-transmit
//! - [`OutputDriver`]: periodic output thread
//!
//! ## Example
//!
//! ```rust
//! use lumachain_core::{BlendMode, Fixture, Pixel, Protocol};
//! use lumachain_render::{Controller, RecordingSink};
//!
//! let sink = RecordingSink::new();
//! let mut controller = Controller::new("strip", Protocol::Apa102, sink.clone());
//!
//! let mut fixture = Fixture::new(1);
//! let layer = fixture.add_layer();
//! layer.set_mode(BlendMode::Overwrite);
//! layer.fill(Pixel::new(255, 1, 2, 3));
//! controller.add_fixture(fixture)?;
//! controller.recompute_chain();
//!
//! controller.show()?;
//! assert_eq!(sink.last_frame().unwrap(), vec![0, 0, 0, 0, 0xFF, 3, 2, 1]);
//! # Ok::<(), lumachain_render::OutputError>(())
//! ```

pub mod controller;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod sink;

pub use controller::Controller;
pub use driver::{DriverConfig, DriverStats, OutputDriver, DEFAULT_FRAME_PERIOD};
pub use error::{OutputError, Result};
pub use protocol::{encoder_for, Apa102Encoder, PostAmble, ProtocolEncoder, Ws2812Encoder};
pub use sink::{FrameSink, LatestFrameSink, RecordingSink, SpiSink, TwoWireSink};
