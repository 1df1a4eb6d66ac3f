//! Wire encoders for LED driver chips
//!
//! An encoder turns one composited chain of pixels into the exact byte
//! stream clocked out to the strip, framing included.

use lumachain_core::{Pixel, Protocol};
use serde::{Deserialize, Serialize};

/// Bytes appended after the pixel data.
///
/// The total is `constant + ceil(pixels / per_pixels)` bytes of `fill`;
/// `per_pixels == 0` disables the pixel-dependent part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostAmble {
    pub constant: usize,
    pub per_pixels: usize,
    pub fill: u8,
}

impl PostAmble {
    /// No trailing bytes
    pub const NONE: PostAmble = PostAmble {
        constant: 0,
        per_pixels: 0,
        fill: 0,
    };

    /// APA102 end frame: enough extra clock edges to push data through
    /// every pixel's half-cycle delay (one byte per 16 pixels)
    pub fn apa102_end_frame() -> Self {
        Self {
            constant: 0,
            per_pixels: 16,
            fill: 0,
        }
    }

    /// Trailer length for a chain of `pixels`
    pub fn len_for(&self, pixels: usize) -> usize {
        let scaled = if self.per_pixels == 0 {
            0
        } else {
            pixels.div_ceil(self.per_pixels)
        };
        self.constant + scaled
    }

    fn write(&self, pixels: usize, out: &mut Vec<u8>) {
        out.resize(out.len() + self.len_for(pixels), self.fill);
    }
}

/// Turns a composited chain into wire bytes
pub trait ProtocolEncoder: Send {
    /// Chip family this encoder speaks
    fn protocol(&self) -> Protocol;

    /// Bytes per pixel on the wire
    fn bytes_per_pixel(&self) -> usize;

    /// Encode a full frame, replacing the contents of `out`
    fn encode_into(&self, pixels: &[Pixel], out: &mut Vec<u8>);

    /// Total frame length for a chain of `pixels`
    fn frame_len(&self, pixels: usize) -> usize;

    fn encode(&self, pixels: &[Pixel]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.frame_len(pixels.len()));
        self.encode_into(pixels, &mut out);
        out
    }
}

/// APA102 / SK9822 two-wire encoder
///
/// Frame: four zero bytes, then per pixel `0xE0 | (alpha >> 3), B, G, R`,
/// then the post-amble. Alpha drives the chip's 5-bit global brightness.
#[derive(Debug, Clone, Default)]
pub struct Apa102Encoder {
    post_amble: PostAmble,
}

impl Apa102Encoder {
    pub const START_FRAME_LEN: usize = 4;
    const BRIGHTNESS_MARKER: u8 = 0xE0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post_amble(post_amble: PostAmble) -> Self {
        Self { post_amble }
    }

    pub fn post_amble(&self) -> PostAmble {
        self.post_amble
    }
}

impl ProtocolEncoder for Apa102Encoder {
    fn protocol(&self) -> Protocol {
        Protocol::Apa102
    }

    fn bytes_per_pixel(&self) -> usize {
        4
    }

    fn frame_len(&self, pixels: usize) -> usize {
        let body = pixels * self.bytes_per_pixel();
        Self::START_FRAME_LEN + body + self.post_amble.len_for(pixels)
    }

    fn encode_into(&self, pixels: &[Pixel], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.frame_len(pixels.len()));
        out.extend_from_slice(&[0; Self::START_FRAME_LEN]);
        for p in pixels {
            out.extend_from_slice(&[Self::BRIGHTNESS_MARKER | (p.a >> 3), p.b, p.g, p.r]);
        }
        self.post_amble.write(pixels.len(), out);
    }
}

/// WS2812 encoder producing GRB bytes.
///
/// The leading zero bytes hold the line low long enough for the strip to
/// latch the previous frame when streamed through a byte-oriented output.
/// Alpha is not transmitted.
#[derive(Debug, Clone, Default)]
pub struct Ws2812Encoder {
    post_amble: PostAmble,
}

impl Ws2812Encoder {
    pub const RESET_LEN: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post_amble(post_amble: PostAmble) -> Self {
        Self { post_amble }
    }
}

impl ProtocolEncoder for Ws2812Encoder {
    fn protocol(&self) -> Protocol {
        Protocol::Ws2812
    }

    fn bytes_per_pixel(&self) -> usize {
        3
    }

    fn frame_len(&self, pixels: usize) -> usize {
        let body = pixels * self.bytes_per_pixel();
        Self::RESET_LEN + body + self.post_amble.len_for(pixels)
    }

    fn encode_into(&self, pixels: &[Pixel], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.frame_len(pixels.len()));
        out.extend_from_slice(&[0; Self::RESET_LEN]);
        for p in pixels {
            out.extend_from_slice(&[p.g, p.r, p.b]);
        }
        self.post_amble.write(pixels.len(), out);
    }
}

/// Encoder for a protocol
pub fn encoder_for(protocol: Protocol, post_amble: PostAmble) -> Box<dyn ProtocolEncoder> {
    match protocol {
        Protocol::Apa102 => Box::new(Apa102Encoder::with_post_amble(post_amble)),
        Protocol::Ws2812 => Box::new(Ws2812Encoder::with_post_amble(post_amble)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apa102_literal_frame() {
        let pixels = [Pixel::new(255, 10, 20, 30), Pixel::new(255, 0, 0, 0), Pixel::new(255, 1, 2, 3)];
        let frame = Apa102Encoder::new().encode(&pixels);
        assert_eq!(
            frame,
            vec![
                0x00, 0x00, 0x00, 0x00, //
                0xFF, 0x1E, 0x14, 0x0A, //
                0xFF, 0x00, 0x00, 0x00, //
                0xFF, 0x03, 0x02, 0x01,
            ]
        );
    }

    #[test]
    fn test_apa102_brightness_bits() {
        let frame = Apa102Encoder::new().encode(&[Pixel::new(0, 1, 1, 1), Pixel::new(0x47, 1, 1, 1)]);
        assert_eq!(frame[4], 0xE0);
        assert_eq!(frame[8], 0xE0 | 0x08);
    }

    #[test]
    fn test_empty_chain_is_start_frame_only() {
        assert_eq!(Apa102Encoder::new().encode(&[]), vec![0; 4]);
        assert_eq!(
            Apa102Encoder::with_post_amble(PostAmble::apa102_end_frame()).encode(&[]),
            vec![0; 4]
        );
    }

    #[test]
    fn test_ws2812_grb_order() {
        let frame = Ws2812Encoder::new().encode(&[Pixel::new(17, 1, 2, 3)]);
        assert_eq!(frame, vec![0, 0, 0, 0, 0, 2, 1, 3]);
    }

    #[test]
    fn test_post_amble_length() {
        assert_eq!(PostAmble::NONE.len_for(100), 0);
        let end = PostAmble::apa102_end_frame();
        assert_eq!(end.len_for(1), 1);
        assert_eq!(end.len_for(16), 1);
        assert_eq!(end.len_for(17), 2);

        let custom = PostAmble {
            constant: 2,
            per_pixels: 0,
            fill: 0xFF,
        };
        let frame = Apa102Encoder::with_post_amble(custom).encode(&[Pixel::OFF]);
        assert_eq!(&frame[8..], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_frame_len_matches_encoding() {
        let pixels = vec![Pixel::rgb(1, 2, 3); 33];
        for protocol in [Protocol::Apa102, Protocol::Ws2812] {
            let encoder = encoder_for(protocol, PostAmble::apa102_end_frame());
            assert_eq!(encoder.encode(&pixels).len(), encoder.frame_len(33));
            assert_eq!(encoder.protocol(), protocol);
        }
    }
}
