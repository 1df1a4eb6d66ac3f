//! Layer system for compositing pixel contributions
//!
//! A fixture owns a stack of layers. Each layer holds a full frame of pixel
//! data plus a blend mode deciding how it is combined with the layers below.
//! Layer data may be written from any thread (direct writes or universe
//! ingestion) while the output thread composites: every write builds a
//! complete new buffer and swaps it in, so compositing only ever observes
//! whole writes.

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::pixel::div255;
use crate::{ChannelMapping, CoreError, Pixel, PixelBuffer, Result};

/// Blend mode for compositing a layer onto the layers beneath it
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Excluded from compositing; data is kept for later
    Skip = 0,
    /// Replace every pixel, ignoring alpha
    Overwrite = 1,
    /// Alpha-over blend using the layer's alpha channel (default)
    #[default]
    Composite = 2,
    /// Clear each channel beneath wherever this layer's channel is non-zero
    Mask = 3,
}

impl BlendMode {
    /// List all available blend modes
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Skip,
            BlendMode::Overwrite,
            BlendMode::Composite,
            BlendMode::Mask,
        ]
    }

    fn from_u8(value: u8) -> BlendMode {
        match value {
            1 => BlendMode::Overwrite,
            2 => BlendMode::Composite,
            3 => BlendMode::Mask,
            _ => BlendMode::Skip,
        }
    }

    /// Combine `src` onto the accumulator `dst`, pixel by pixel.
    ///
    /// Both slices have the fixture's pixel count.
    pub fn apply(self, dst: &mut [Pixel], src: &[Pixel]) {
        debug_assert_eq!(dst.len(), src.len());
        match self {
            BlendMode::Skip => {}
            BlendMode::Overwrite => dst.copy_from_slice(src),
            BlendMode::Composite => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = composite_over(*d, *s);
                }
            }
            BlendMode::Mask => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = mask(*d, *s);
                }
            }
        }
    }
}

/// Straight alpha-over: `s` weighted by its alpha, `d` by the remainder.
/// The result's alpha accumulates toward 255.
#[inline]
fn composite_over(d: Pixel, s: Pixel) -> Pixel {
    let a = s.a as u32;
    let inv = 255 - a;
    let mix = |top: u8, bottom: u8| div255(top as u32 * a + bottom as u32 * inv);
    Pixel {
        a: s.a + div255(d.a as u32 * inv),
        r: mix(s.r, d.r),
        g: mix(s.g, d.g),
        b: mix(s.b, d.b),
    }
}

#[inline]
fn mask(d: Pixel, s: Pixel) -> Pixel {
    let keep = |bottom: u8, m: u8| if m != 0 { 0 } else { bottom };
    Pixel {
        a: keep(d.a, s.a),
        r: keep(d.r, s.r),
        g: keep(d.g, s.g),
        b: keep(d.b, s.b),
    }
}

/// One contributor to a fixture's frame
#[derive(Debug)]
pub struct Layer {
    len: usize,
    mode: AtomicU8,
    pixels: ArcSwap<PixelBuffer>,
    mappings: RwLock<Vec<ChannelMapping>>,
}

impl Layer {
    /// Create a transparent layer of `len` pixels in composite mode
    pub(crate) fn new(len: usize) -> Self {
        Self {
            len,
            mode: AtomicU8::new(BlendMode::default() as u8),
            pixels: ArcSwap::from_pointee(PixelBuffer::new(len)),
            mappings: RwLock::new(Vec::new()),
        }
    }

    /// Number of pixels (the owning fixture's pixel count)
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the layer has no pixels
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current blend mode
    pub fn mode(&self) -> BlendMode {
        BlendMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Change the blend mode; takes effect on the next compositing pass
    pub fn set_mode(&self, mode: BlendMode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Latest committed pixel data
    pub fn snapshot(&self) -> Arc<PixelBuffer> {
        self.pixels.load_full()
    }

    /// Write `pixels` starting at layer index `start`.
    ///
    /// Rows that would run past the end of the layer are dropped. Returns the
    /// number of pixels written.
    pub fn set(&self, start: usize, pixels: &[Pixel]) -> Result<usize> {
        if start >= self.len {
            return Err(CoreError::IndexOutOfRange {
                index: start,
                len: self.len,
            });
        }
        let count = pixels.len().min(self.len - start);
        if count < pixels.len() {
            tracing::debug!(
                "Clipped {} pixels past end of layer (len {})",
                pixels.len() - count,
                self.len
            );
        }

        self.pixels.rcu(|current| {
            let mut next = PixelBuffer::clone(current);
            next.as_mut_slice()[start..start + count].copy_from_slice(&pixels[..count]);
            next
        });
        Ok(count)
    }

    /// Set every pixel to the same value
    pub fn fill(&self, pixel: Pixel) {
        self.pixels.store(Arc::new(PixelBuffer::filled(self.len, pixel)));
    }

    /// Register a channel mapping that feeds this layer.
    ///
    /// The mapping must fit inside the layer and must not share pixels with
    /// any mapping already registered.
    pub fn add_mapping(&self, mapping: ChannelMapping) -> Result<()> {
        mapping.validate(self.len)?;

        let mut mappings = self.mappings.write();
        if mappings.iter().any(|existing| existing.overlaps(&mapping)) {
            let range = mapping.pixel_range();
            return Err(CoreError::MappingOverlap {
                start: range.start,
                end: range.end,
            });
        }

        tracing::debug!(
            "Layer mapping added: universe {} -> pixels {:?} ({:?})",
            mapping.universe,
            mapping.pixel_range(),
            mapping.layout
        );
        mappings.push(mapping);
        Ok(())
    }

    /// Remove a previously registered mapping
    pub fn remove_mapping(&self, mapping: &ChannelMapping) -> bool {
        let mut mappings = self.mappings.write();
        let before = mappings.len();
        mappings.retain(|m| m != mapping);
        mappings.len() != before
    }

    /// All registered mappings
    pub fn mappings(&self) -> Vec<ChannelMapping> {
        self.mappings.read().clone()
    }

    /// Whether any mapping reads from `universe`
    pub fn listens_to(&self, universe: u16) -> bool {
        self.mappings.read().iter().any(|m| m.universe == universe)
    }

    /// Apply a single mapping to this layer, all or nothing
    pub fn apply_mapping(&self, mapping: &ChannelMapping, data: &[u8]) -> Result<()> {
        mapping.validate(self.len)?;
        let channels = mapping.channels(data)?;
        self.pixels.rcu(|current| {
            let mut next = PixelBuffer::clone(current);
            mapping.write_pixels(channels, next.as_mut_slice());
            next
        });
        Ok(())
    }

    /// Feed one universe's channel data through every mapping registered for
    /// it.
    ///
    /// A mapping whose input is too short is skipped for this delivery and
    /// keeps its previous pixels; the others still apply.
    pub fn ingest(&self, universe: u16, data: &[u8]) -> IngestReport {
        let mut report = IngestReport::default();
        let mappings = self.mappings.read();
        for mapping in mappings.iter().filter(|m| m.universe == universe) {
            match self.apply_mapping(mapping, data) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    tracing::debug!("Skipped mapping: {}", e);
                    report.skipped += 1;
                }
            }
        }
        report
    }
}

/// Outcome of feeding one universe into a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Mappings written
    pub applied: usize,
    /// Mappings skipped because their input was truncated
    pub skipped: usize,
}

impl IngestReport {
    /// Accumulate another report into this one
    pub fn merge(&mut self, other: IngestReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelLayout;

    #[test]
    fn test_blend_mode_round_trip() {
        let layer = Layer::new(1);
        for mode in BlendMode::all() {
            layer.set_mode(*mode);
            assert_eq!(layer.mode(), *mode);
        }
    }

    #[test]
    fn test_new_layer_is_transparent_composite() {
        let layer = Layer::new(3);
        assert_eq!(layer.mode(), BlendMode::Composite);
        assert!(layer.snapshot().iter().all(|p| *p == Pixel::OFF));
    }

    #[test]
    fn test_composite_full_alpha_replaces() {
        let below = Pixel::new(255, 9, 9, 9);
        let above = Pixel::new(255, 1, 2, 3);
        assert_eq!(composite_over(below, above), above);
    }

    #[test]
    fn test_composite_zero_alpha_keeps_below() {
        let below = Pixel::new(120, 9, 8, 7);
        let above = Pixel::new(0, 200, 200, 200);
        assert_eq!(composite_over(below, above), below);
    }

    #[test]
    fn test_composite_half_alpha() {
        let below = Pixel::new(255, 0, 0, 0);
        let above = Pixel::new(128, 255, 255, 255);
        let out = composite_over(below, above);
        assert_eq!(out.a, 255);
        assert_eq!(out.r, 128);
    }

    #[test]
    fn test_composite_alpha_accumulates() {
        let below = Pixel::new(128, 0, 0, 0);
        let above = Pixel::new(128, 0, 0, 0);
        let out = composite_over(below, above);
        // 128 + 128 * 127 / 255
        assert_eq!(out.a, 192);
    }

    #[test]
    fn test_mask_clears_nonzero_channels() {
        let mut dst = [Pixel::new(255, 10, 20, 30)];
        BlendMode::Mask.apply(&mut dst, &[Pixel::new(0, 1, 0, 1)]);
        assert_eq!(dst[0], Pixel::new(255, 0, 20, 0));
    }

    #[test]
    fn test_set_clips_and_rejects() {
        let layer = Layer::new(3);
        let written = layer
            .set(2, &[Pixel::rgb(1, 1, 1), Pixel::rgb(2, 2, 2)])
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(layer.snapshot()[2], Pixel::rgb(1, 1, 1));

        assert_eq!(
            layer.set(3, &[Pixel::OFF]),
            Err(CoreError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_overlapping_mapping_rejected() {
        let layer = Layer::new(20);
        layer
            .add_mapping(ChannelMapping::new(0, 10, ChannelLayout::Rgb, 0))
            .unwrap();
        let err = layer
            .add_mapping(ChannelMapping::new(1, 5, ChannelLayout::Rgb, 8))
            .unwrap_err();
        assert!(matches!(err, CoreError::MappingOverlap { start: 8, end: 13 }));
        assert!(err.is_configuration());
        assert_eq!(layer.mappings().len(), 1);
    }

    #[test]
    fn test_ingest_skips_truncated_mapping_only() {
        let layer = Layer::new(4);
        layer
            .add_mapping(ChannelMapping::new(0, 2, ChannelLayout::Rgb, 0))
            .unwrap();
        layer
            .add_mapping(ChannelMapping::new(0, 2, ChannelLayout::Rgb, 2).with_start_channel(6))
            .unwrap();

        // Long enough for the first mapping, not the second
        let report = layer.ingest(0, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(report, IngestReport { applied: 1, skipped: 1 });

        let pixels = layer.snapshot();
        assert_eq!(pixels[1], Pixel::new(0, 4, 5, 6));
        assert_eq!(pixels[2], Pixel::OFF);
    }

    #[test]
    fn test_ingest_ignores_other_universes() {
        let layer = Layer::new(1);
        layer
            .add_mapping(ChannelMapping::new(7, 1, ChannelLayout::Rgb, 0))
            .unwrap();
        assert!(layer.listens_to(7));
        assert!(!layer.listens_to(8));
        assert_eq!(layer.ingest(8, &[1, 2, 3]), IngestReport::default());
    }

    #[test]
    fn test_extreme_offsets_fail_without_panic() {
        let layer = Layer::new(8);
        let err = layer
            .add_mapping(ChannelMapping::new(0, 1, ChannelLayout::Rgb, usize::MAX))
            .unwrap_err();
        assert!(matches!(err, CoreError::MappingOutOfRange { len: 8, .. }));
        assert!(layer.mappings().is_empty());

        let far = ChannelMapping::new(0, 1, ChannelLayout::Rgb, 0).with_start_channel(usize::MAX);
        assert!(layer.add_mapping(far).is_err());
        assert!(layer.apply_mapping(&far, &[1, 2, 3]).is_err());
        assert!(layer.snapshot().iter().all(|p| *p == Pixel::OFF));
    }

    #[test]
    fn test_remove_mapping() {
        let layer = Layer::new(4);
        let mapping = ChannelMapping::new(0, 4, ChannelLayout::Argb, 0);
        layer.add_mapping(mapping).unwrap();
        assert!(layer.remove_mapping(&mapping));
        assert!(!layer.remove_mapping(&mapping));
        assert!(!layer.listens_to(0));
    }

    #[test]
    fn test_blend_mode_serde_names() {
        assert_eq!(serde_json::to_string(&BlendMode::Overwrite).unwrap(), "\"overwrite\"");
        let mode: BlendMode = serde_json::from_str("\"mask\"").unwrap();
        assert_eq!(mode, BlendMode::Mask);
    }
}
