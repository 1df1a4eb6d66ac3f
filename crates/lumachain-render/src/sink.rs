//! Physical outputs that accept encoded frames

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::{OutputError, Result};

/// Destination for encoded frames. A write blocks until the whole frame is
/// on the wire.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()>;
}

/// Software-clocked two-wire output (data + clock).
///
/// Bytes go out MSB first. For each bit the data line is set, then the clock
/// is driven low and back high so the chip latches on the rising edge.
pub struct TwoWireSink<D, C> {
    data: D,
    clock: C,
}

impl<D: OutputPin, C: OutputPin> TwoWireSink<D, C> {
    pub fn new(data: D, clock: C) -> Self {
        Self { data, clock }
    }

    /// Give the pins back
    pub fn release(self) -> (D, C) {
        (self.data, self.clock)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        for bit in (0..8).rev() {
            if (byte >> bit) & 1 == 1 {
                self.data.set_high().map_err(pin_error)?;
            } else {
                self.data.set_low().map_err(pin_error)?;
            }
            self.clock.set_low().map_err(pin_error)?;
            self.clock.set_high().map_err(pin_error)?;
        }
        Ok(())
    }
}

fn pin_error<E: std::fmt::Debug>(e: E) -> OutputError {
    OutputError::Sink(format!("pin: {e:?}"))
}

impl<D, C> FrameSink for TwoWireSink<D, C>
where
    D: OutputPin + Send,
    C: OutputPin + Send,
{
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        for &byte in frame {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

/// Hardware SPI output; the whole frame is one transfer
pub struct SpiSink<S> {
    bus: S,
}

impl<S: SpiBus<u8>> SpiSink<S> {
    pub fn new(bus: S) -> Self {
        Self { bus }
    }

    pub fn release(self) -> S {
        self.bus
    }
}

impl<S> FrameSink for SpiSink<S>
where
    S: SpiBus<u8> + Send,
{
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.bus
            .write(frame)
            .map_err(|e| OutputError::Sink(format!("spi: {e:?}")))?;
        self.bus
            .flush()
            .map_err(|e| OutputError::Sink(format!("spi: {e:?}")))
    }
}

/// Keeps every frame in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames written so far
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.frames.lock().last().cloned()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// Remove and return the recorded frames
    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.frames.lock())
    }
}

impl FrameSink for RecordingSink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.frames.lock().push(frame.to_vec());
        Ok(())
    }
}

/// Keeps only the most recent frame. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct LatestFrameSink {
    latest: Arc<Mutex<LatestFrame>>,
}

#[derive(Debug, Default)]
struct LatestFrame {
    frame: Option<Vec<u8>>,
    count: u64,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.latest.lock().frame.clone()
    }

    /// Frames written since creation
    pub fn frame_count(&self) -> u64 {
        self.latest.lock().count
    }
}

impl FrameSink for LatestFrameSink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut latest = self.latest.lock();
        let slot = latest.frame.get_or_insert_with(Vec::new);
        slot.clear();
        slot.extend_from_slice(frame);
        latest.count += 1;
        Ok(())
    }
}
