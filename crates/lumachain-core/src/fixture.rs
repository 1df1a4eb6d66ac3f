//! Fixtures: fixed-length runs of pixels with a stack of layers

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{mul8, Layer, Pixel, PixelBuffer};

/// LED driver chip family a fixture or controller speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Two-wire (clock + data) chips with a 5-bit global brightness field
    Apa102,
    /// Single-wire GRB chips
    Ws2812,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Apa102 => write!(f, "APA102"),
            Protocol::Ws2812 => write!(f, "WS2812"),
        }
    }
}

/// A physical run of pixels and the layers that paint it
#[derive(Debug)]
pub struct Fixture {
    name: String,
    pixel_count: usize,
    brightness: u8,
    protocol: Option<Protocol>,
    layers: Vec<Arc<Layer>>,
    offset: Option<usize>,
}

impl Fixture {
    /// Create a fixture with no layers
    pub fn new(pixel_count: usize) -> Self {
        Self {
            name: String::new(),
            pixel_count,
            brightness: 255,
            protocol: None,
            layers: Vec::new(),
            offset: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the fixture brightness
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    /// Declare the protocol this fixture is wired for
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Display name, empty unless set
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of pixels; fixed at creation
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Protocol the fixture declared, if any
    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    /// Brightness multiplier applied to composited alpha (255 = unchanged)
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Change the brightness; takes effect on the next frame
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Start index in the owning controller's chain, once laid out
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Append a new transparent layer on top of the stack
    pub fn add_layer(&mut self) -> Arc<Layer> {
        let layer = Arc::new(Layer::new(self.pixel_count));
        self.layers.push(Arc::clone(&layer));
        tracing::debug!(
            "Fixture '{}' now has {} layers",
            self.name,
            self.layers.len()
        );
        layer
    }

    /// Layers in paint order (bottom first)
    pub fn layers(&self) -> &[Arc<Layer>] {
        &self.layers
    }

    /// Get a layer by stack index
    pub fn layer(&self, index: usize) -> Option<&Arc<Layer>> {
        self.layers.get(index)
    }

    /// Composite the layer stack into `out`, which must hold exactly
    /// `pixel_count` pixels.
    ///
    /// Each layer's latest committed data is read; nothing is cached between
    /// passes.
    pub fn composite_into(&self, out: &mut [Pixel]) {
        debug_assert_eq!(out.len(), self.pixel_count);
        out.fill(Pixel::OFF);
        for layer in &self.layers {
            let mode = layer.mode();
            if mode == crate::BlendMode::Skip {
                continue;
            }
            let data = layer.snapshot();
            mode.apply(out, data.as_slice());
        }
    }

    /// Composite the layer stack into a new buffer
    pub fn composite(&self) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(self.pixel_count);
        self.composite_into(buffer.as_mut_slice());
        buffer
    }

    /// Composite and apply fixture brightness; this is what goes on the wire
    pub fn render_into(&self, out: &mut [Pixel]) {
        self.composite_into(out);
        if self.brightness != 255 {
            for pixel in out.iter_mut() {
                pixel.a = mul8(pixel.a, self.brightness);
            }
        }
    }
}

/// Assign each fixture a contiguous start offset, packed in order.
///
/// Returns the total pixel count of the chain.
pub fn layout_chain(fixtures: &mut [Fixture]) -> usize {
    let mut total = 0;
    for fixture in fixtures.iter_mut() {
        fixture.offset = Some(total);
        total += fixture.pixel_count;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlendMode;

    #[test]
    fn test_empty_stack_is_off() {
        let fixture = Fixture::new(5);
        assert_eq!(fixture.composite(), PixelBuffer::new(5));
    }

    #[test]
    fn test_paint_order() {
        let mut fixture = Fixture::new(1);
        let bottom = fixture.add_layer();
        let top = fixture.add_layer();
        bottom.set_mode(BlendMode::Overwrite);
        top.set_mode(BlendMode::Overwrite);
        bottom.fill(Pixel::rgb(1, 1, 1));
        top.fill(Pixel::rgb(2, 2, 2));
        assert_eq!(fixture.composite()[0], Pixel::rgb(2, 2, 2));

        top.set_mode(BlendMode::Skip);
        assert_eq!(fixture.composite()[0], Pixel::rgb(1, 1, 1));
    }

    #[test]
    fn test_brightness_scales_alpha() {
        let mut fixture = Fixture::new(2).with_brightness(128);
        let layer = fixture.add_layer();
        layer.set_mode(BlendMode::Overwrite);
        layer.fill(Pixel::rgb(10, 20, 30));

        let mut out = [Pixel::OFF; 2];
        fixture.render_into(&mut out);
        assert_eq!(out[0], Pixel::new(128, 10, 20, 30));
    }

    #[test]
    fn test_layout_packs_fixtures() {
        let mut fixtures = vec![Fixture::new(3), Fixture::new(0), Fixture::new(5)];
        assert_eq!(layout_chain(&mut fixtures), 8);
        let offsets: Vec<_> = fixtures.iter().map(|f| f.offset()).collect();
        assert_eq!(offsets, vec![Some(0), Some(3), Some(3)]);
    }

    #[test]
    fn test_layers_share_fixture_length() {
        let mut fixture = Fixture::new(7);
        let layer = fixture.add_layer();
        assert_eq!(layer.len(), 7);
        assert!(Arc::ptr_eq(&layer, fixture.layer(0).unwrap()));
    }
}
