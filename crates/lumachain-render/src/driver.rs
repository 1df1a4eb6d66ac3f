//! Periodic output thread
//!
//! Composites, encodes and transmits a controller's chain at a fixed frame
//! period while the controller is running. Holding the controller lock for
//! the whole pass keeps layout changes from landing mid-frame.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{Controller, Result};

/// Default frame period (~30 Hz)
pub const DEFAULT_FRAME_PERIOD: Duration = Duration::from_micros(33_333);

/// Output driver statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverStats {
    pub frames_sent: u64,
    pub frames_failed: u64,
    pub bytes_sent: u64,
    pub last_frame_time_us: u64,
}

/// Output driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub frame_period: Duration,
}

impl DriverConfig {
    /// Period for a frame rate in Hz; non-positive rates fall back to the
    /// default period
    pub fn from_frame_rate(hz: f64) -> Self {
        let frame_period = if hz > 0.0 && hz.is_finite() {
            Duration::from_secs_f64(1.0 / hz)
        } else {
            DEFAULT_FRAME_PERIOD
        };
        Self { frame_period }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_period: DEFAULT_FRAME_PERIOD,
        }
    }
}

/// Runs a controller's output loop on its own thread
pub struct OutputDriver {
    running: Arc<AtomicBool>,
    stats: Arc<RwLock<DriverStats>>,
    thread: Option<JoinHandle<()>>,
}

impl OutputDriver {
    /// Spawn a driver at the default frame period
    pub fn spawn(controller: Arc<Mutex<Controller>>) -> Result<Self> {
        Self::with_config(controller, DriverConfig::default())
    }

    pub fn with_config(controller: Arc<Mutex<Controller>>, config: DriverConfig) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(RwLock::new(DriverStats::default()));

        let name = format!("output-{}", controller.lock().name());
        let thread = {
            let running = running.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name(name)
                .spawn(move || run(controller, running, stats, config.frame_period))?
        };

        Ok(Self {
            running,
            stats,
            thread: Some(thread),
        })
    }

    pub fn stats(&self) -> DriverStats {
        *self.stats.read()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the output loop and wait for the thread to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Output thread panicked");
            }
        }
    }
}

impl Drop for OutputDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    controller: Arc<Mutex<Controller>>,
    running: Arc<AtomicBool>,
    stats: Arc<RwLock<DriverStats>>,
    period: Duration,
) {
    info!("Output thread started ({:?} period)", period);
    let mut failing = false;

    while running.load(Ordering::Relaxed) {
        let start = Instant::now();

        let result = {
            let mut controller = controller.lock();
            if controller.is_running() {
                Some(controller.show())
            } else {
                None
            }
        };

        match result {
            Some(Ok(bytes)) => {
                if failing {
                    info!("Output recovered");
                    failing = false;
                }
                let mut stats = stats.write();
                stats.frames_sent += 1;
                stats.bytes_sent += bytes as u64;
                stats.last_frame_time_us = start.elapsed().as_micros() as u64;
            }
            Some(Err(e)) => {
                if failing {
                    debug!("Frame refused: {}", e);
                } else {
                    warn!("Frame refused: {}", e);
                    failing = true;
                }
                stats.write().frames_failed += 1;
            }
            None => {}
        }

        let elapsed = start.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        }
    }

    info!("Output thread stopped");
}
