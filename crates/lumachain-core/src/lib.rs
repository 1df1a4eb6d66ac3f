//! Lumachain Core - Pixel model and compositing
//!
//! This crate contains the domain model shared by the rest of Lumachain:
//! - Pixels and fixed-length pixel buffers
//! - Layers with blend modes and universe channel mappings
//! - Fixtures that composite their layer stacks
//! - Chain layout for fixtures sharing one output
//!
//! ## Example
//!
//! ```rust
//! use lumachain_core::{BlendMode, ChannelLayout, ChannelMapping, Fixture, Pixel};
//!
//! let mut fixture = Fixture::new(4);
//! let base = fixture.add_layer();
//! base.set_mode(BlendMode::Overwrite);
//! base.fill(Pixel::rgb(0, 0, 32));
//!
//! let live = fixture.add_layer();
//! live.add_mapping(ChannelMapping::new(0, 4, ChannelLayout::Argb, 0))?;
//! live.ingest(0, &[255, 255, 0, 0, 0, 0, 0, 0, 255, 0, 255, 0, 0, 0, 0, 0]);
//!
//! let frame = fixture.composite();
//! assert_eq!(frame[0], Pixel::rgb(255, 0, 0));
//! assert_eq!(frame[1], Pixel::rgb(0, 0, 32));
//! # Ok::<(), lumachain_core::CoreError>(())
//! ```

#![warn(missing_docs)]

/// Error types
pub mod error;
pub mod fixture;
pub mod layer;
pub mod mapping;
pub mod pixel;

pub use error::{CoreError, Result};
pub use fixture::{layout_chain, Fixture, Protocol};
pub use layer::{BlendMode, IngestReport, Layer};
pub use mapping::{ChannelLayout, ChannelMapping, UNIVERSE_CHANNELS};
pub use pixel::{mul8, Pixel, PixelBuffer};
