//! Universe channel data to layer pixel mapping
//!
//! A [`ChannelMapping`] reads a contiguous run of channels from one universe
//! and writes it onto a contiguous run of layer pixels.
//!
//! Channel groups are read in buffer order. Group `i` lands on layer pixel
//! `start_index + i`:
//!
//! - [`ChannelLayout::Rgb`]: `R, G, B`; the pixel's alpha is left as it was
//! - [`ChannelLayout::Argb`]: `A, R, G, B`
//!
//! ```rust
//! use lumachain_core::{ChannelLayout, ChannelMapping, Pixel};
//!
//! let mapping = ChannelMapping::new(0, 2, ChannelLayout::Rgb, 0);
//! let mut pixels = [Pixel::OFF.with_alpha(255); 2];
//! let channels = mapping.channels(&[10, 20, 30, 40, 50, 60]).unwrap();
//! mapping.write_pixels(channels, &mut pixels);
//! assert_eq!(pixels[1], Pixel::new(255, 40, 50, 60));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::{CoreError, Pixel, Result};

/// Channels carried by one universe
pub const UNIVERSE_CHANNELS: usize = 512;

/// How many channels make up one pixel, and in what order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// Three channels: red, green, blue
    Rgb,
    /// Four channels: alpha, red, green, blue
    Argb,
}

impl ChannelLayout {
    /// Channels consumed per pixel
    pub fn channels_per_pixel(self) -> usize {
        match self {
            ChannelLayout::Rgb => 3,
            ChannelLayout::Argb => 4,
        }
    }

    /// Layout from a raw channels-per-pixel count
    pub fn from_channels_per_pixel(cpp: u8) -> Result<Self> {
        match cpp {
            3 => Ok(ChannelLayout::Rgb),
            4 => Ok(ChannelLayout::Argb),
            other => Err(CoreError::InvalidChannelsPerPixel(other)),
        }
    }
}

/// Binding of one universe's channel run to a range of layer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMapping {
    /// Universe the channels are read from
    pub universe: u16,
    /// Number of layer pixels written
    pub pixel_count: usize,
    /// Channel grouping per pixel
    pub layout: ChannelLayout,
    /// First layer pixel written
    pub start_index: usize,
    /// First channel read from the universe buffer (0-based)
    #[serde(default)]
    pub start_channel: usize,
}

impl ChannelMapping {
    /// Create a mapping reading from channel 0 of `universe`
    pub fn new(universe: u16, pixel_count: usize, layout: ChannelLayout, start_index: usize) -> Self {
        Self {
            universe,
            pixel_count,
            layout,
            start_index,
            start_channel: 0,
        }
    }

    /// Read from a channel offset inside the universe
    pub fn with_start_channel(mut self, start_channel: usize) -> Self {
        self.start_channel = start_channel;
        self
    }

    /// Layer pixels covered by this mapping. The end saturates at
    /// `usize::MAX`; [`ChannelMapping::validate`] rejects such mappings.
    pub fn pixel_range(&self) -> Range<usize> {
        self.start_index..self.start_index.saturating_add(self.pixel_count)
    }

    /// Channels consumed from the universe buffer (saturating)
    pub fn channel_len(&self) -> usize {
        self.pixel_count
            .saturating_mul(self.layout.channels_per_pixel())
    }

    /// One past the last channel read, or `None` if it does not fit in a
    /// `usize`
    pub fn channel_end(&self) -> Option<usize> {
        self.pixel_count
            .checked_mul(self.layout.channels_per_pixel())
            .and_then(|len| self.start_channel.checked_add(len))
    }

    /// Whether two mappings share any layer pixel
    pub fn overlaps(&self, other: &ChannelMapping) -> bool {
        let a = self.pixel_range();
        let b = other.pixel_range();
        a.start < b.end && b.start < a.end
    }

    /// Check this mapping fits inside a layer of `layer_len` pixels and
    /// reads only channels a universe can carry
    pub fn validate(&self, layer_len: usize) -> Result<()> {
        match self.start_index.checked_add(self.pixel_count) {
            Some(end) if end <= layer_len => {}
            end => {
                return Err(CoreError::MappingOutOfRange {
                    start: self.start_index,
                    end: end.unwrap_or(usize::MAX),
                    len: layer_len,
                })
            }
        }

        match self.channel_end() {
            Some(end) if end <= UNIVERSE_CHANNELS => Ok(()),
            _ => Err(CoreError::ChannelsOutOfRange {
                start: self.start_channel,
                len: self.channel_len(),
                max: UNIVERSE_CHANNELS,
            }),
        }
    }

    /// The exact channel slice this mapping consumes from a universe buffer.
    ///
    /// Fails with [`CoreError::TruncatedInput`] when the buffer is too short;
    /// nothing has been written at that point.
    pub fn channels<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        let truncated = |expected| CoreError::TruncatedInput {
            universe: self.universe,
            expected,
            actual: data.len(),
        };
        let end = self.channel_end().ok_or_else(|| truncated(usize::MAX))?;
        data.get(self.start_channel..end)
            .ok_or_else(|| truncated(end))
    }

    /// Write a channel slice returned by [`ChannelMapping::channels`] into
    /// the pixels of a layer.
    ///
    /// `pixels` is the whole layer; `channels` must hold exactly
    /// [`ChannelMapping::channel_len`] bytes.
    pub fn write_pixels(&self, channels: &[u8], pixels: &mut [Pixel]) {
        debug_assert_eq!(channels.len(), self.channel_len());
        let Some(targets) = pixels.get_mut(self.pixel_range()) else {
            return;
        };
        let groups = channels.chunks_exact(self.layout.channels_per_pixel());

        match self.layout {
            ChannelLayout::Rgb => {
                for (pixel, group) in targets.iter_mut().zip(groups) {
                    pixel.r = group[0];
                    pixel.g = group[1];
                    pixel.b = group[2];
                }
            }
            ChannelLayout::Argb => {
                for (pixel, group) in targets.iter_mut().zip(groups) {
                    *pixel = Pixel::new(group[0], group[1], group[2], group[3]);
                }
            }
        }
    }

    /// Serialize layer pixels back into channel data using this mapping's
    /// layout. Used to mirror a layer onto a universe.
    pub fn read_pixels(&self, pixels: &[Pixel]) -> Vec<u8> {
        let Some(source) = pixels.get(self.pixel_range()) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.channel_len());
        for pixel in source {
            match self.layout {
                ChannelLayout::Rgb => out.extend_from_slice(&[pixel.r, pixel.g, pixel.b]),
                ChannelLayout::Argb => out.extend_from_slice(&pixel.to_argb()),
            }
        }
        out
    }
}
