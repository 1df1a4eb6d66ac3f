//! Pixel values and fixed-length pixel buffers
//!
//! Every pixel carries four 8-bit channels: alpha (also used as brightness),
//! red, green and blue. Index 0 of a buffer is the first pixel on the wire.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A single ARGB pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pixel {
    /// Alpha / brightness (0 = transparent, 255 = opaque)
    pub a: u8,
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Pixel {
    /// All channels zero (LED off, fully transparent)
    pub const OFF: Pixel = Pixel::new(0, 0, 0, 0);

    /// Create a pixel from alpha, red, green and blue
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Create a fully opaque pixel
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(255, r, g, b)
    }

    /// Build from `[a, r, g, b]`
    pub const fn from_argb(argb: [u8; 4]) -> Self {
        Self::new(argb[0], argb[1], argb[2], argb[3])
    }

    /// Channels as `[a, r, g, b]`
    pub const fn to_argb(self) -> [u8; 4] {
        [self.a, self.r, self.g, self.b]
    }

    /// Same colour with a different alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl From<[u8; 4]> for Pixel {
    fn from(argb: [u8; 4]) -> Self {
        Pixel::from_argb(argb)
    }
}

/// Multiply two values on [0, 255] as if they were fractions on [0.0, 1.0].
///
/// Integer approximation from Smith, "Image Compositing Fundamentals";
/// exact rounding of `a * b / 255` for every input pair.
#[inline]
pub fn mul8(a: u8, b: u8) -> u8 {
    div255(a as u32 * b as u32)
}

/// Rounded `x / 255` for `x <= 255 * 255`
#[inline]
pub(crate) fn div255(x: u32) -> u8 {
    let t = x + 0x80;
    (((t >> 8) + t) >> 8) as u8
}

/// An ordered run of pixels whose length is fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelBuffer {
    pixels: Box<[Pixel]>,
}

impl PixelBuffer {
    /// Create a buffer of `len` pixels, all off
    pub fn new(len: usize) -> Self {
        Self::filled(len, Pixel::OFF)
    }

    /// Create a buffer of `len` copies of `pixel`
    pub fn filled(len: usize, pixel: Pixel) -> Self {
        Self {
            pixels: vec![pixel; len].into_boxed_slice(),
        }
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the buffer holds no pixels
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Get a pixel by index
    pub fn get(&self, index: usize) -> Option<Pixel> {
        self.pixels.get(index).copied()
    }

    /// Pixels in transmission order
    pub fn as_slice(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Mutable access to the pixels; the length stays fixed
    pub fn as_mut_slice(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Iterate pixels in transmission order
    pub fn iter(&self) -> impl Iterator<Item = &Pixel> {
        self.pixels.iter()
    }

    /// Reset every pixel to off
    pub fn clear(&mut self) {
        self.pixels.fill(Pixel::OFF);
    }
}

impl From<Vec<Pixel>> for PixelBuffer {
    fn from(pixels: Vec<Pixel>) -> Self {
        Self {
            pixels: pixels.into_boxed_slice(),
        }
    }
}

impl Index<usize> for PixelBuffer {
    type Output = Pixel;

    fn index(&self, index: usize) -> &Pixel {
        &self.pixels[index]
    }
}
