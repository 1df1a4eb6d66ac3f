//! Background ingest thread

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{UniverseFrame, UniverseRouter, UNIVERSE_SIZE};
use crate::{ControlError, Result};

/// Ingest worker statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub mappings_applied: u64,
    pub mappings_skipped: u64,
}

/// Ingest worker configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Frames buffered between the network side and the worker
    pub queue_depth: usize,
    /// Drop new frames instead of blocking when the queue is full
    pub enable_frame_drop: bool,
    /// How often the worker wakes to check for shutdown
    pub poll_interval: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queue_depth: 64,
            enable_frame_drop: true,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Sending half handed to the network receiver
#[derive(Debug, Clone)]
pub struct UniverseSender {
    tx: Sender<UniverseFrame>,
    stats: Arc<parking_lot::RwLock<IngestStats>>,
    enable_drop: bool,
}

impl UniverseSender {
    /// Queue a universe frame for ingestion.
    ///
    /// Frames longer than one universe are refused. With frame dropping
    /// enabled a full queue drops the frame and returns `Ok(false)`.
    pub fn send(&self, frame: UniverseFrame) -> Result<bool> {
        if frame.data.len() > UNIVERSE_SIZE {
            return Err(ControlError::OversizedFrame {
                universe: frame.universe,
                len: frame.data.len(),
                max: UNIVERSE_SIZE,
            });
        }

        if self.enable_drop {
            match self.tx.try_send(frame) {
                Ok(()) => Ok(true),
                Err(TrySendError::Full(frame)) => {
                    self.stats.write().frames_dropped += 1;
                    debug!("Dropped universe {} frame (queue full)", frame.universe);
                    Ok(false)
                }
                Err(TrySendError::Disconnected(_)) => Err(ControlError::Disconnected),
            }
        } else {
            self.tx
                .send(frame)
                .map(|_| true)
                .map_err(|_| ControlError::Disconnected)
        }
    }
}

/// Applies queued universe frames to layers on a dedicated thread
pub struct IngestWorker {
    tx: Sender<UniverseFrame>,
    running: Arc<AtomicBool>,
    stats: Arc<parking_lot::RwLock<IngestStats>>,
    thread: Option<JoinHandle<()>>,
    config: IngestConfig,
}

impl IngestWorker {
    /// Spawn a worker with default configuration
    pub fn spawn(router: Arc<UniverseRouter>) -> Result<Self> {
        Self::with_config(router, IngestConfig::default())
    }

    /// Spawn a worker with custom configuration
    pub fn with_config(router: Arc<UniverseRouter>, config: IngestConfig) -> Result<Self> {
        let (tx, rx) = bounded(config.queue_depth.max(1));
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(parking_lot::RwLock::new(IngestStats::default()));

        let thread = {
            let running = running.clone();
            let stats = stats.clone();
            let poll = config.poll_interval;
            thread::Builder::new()
                .name("ingest-thread".to_string())
                .spawn(move || run(rx, router, running, stats, poll))?
        };

        Ok(Self {
            tx,
            running,
            stats,
            thread: Some(thread),
            config,
        })
    }

    /// A handle for queueing frames
    pub fn sender(&self) -> UniverseSender {
        UniverseSender {
            tx: self.tx.clone(),
            stats: self.stats.clone(),
            enable_drop: self.config.enable_frame_drop,
        }
    }

    pub fn stats(&self) -> IngestStats {
        *self.stats.read()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the worker and wait for it to exit. Frames still queued are
    /// applied first.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Ingest thread panicked");
            }
        }
    }
}

impl Drop for IngestWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    rx: Receiver<UniverseFrame>,
    router: Arc<UniverseRouter>,
    running: Arc<AtomicBool>,
    stats: Arc<parking_lot::RwLock<IngestStats>>,
    poll: Duration,
) {
    info!("Ingest thread started");

    let apply = |frame: UniverseFrame| {
        let report = router.dispatch_frame(&frame);
        let mut stats = stats.write();
        stats.frames_received += 1;
        stats.mappings_applied += report.applied as u64;
        stats.mappings_skipped += report.skipped as u64;
    };

    while running.load(Ordering::Relaxed) {
        match rx.recv_timeout(poll) {
            Ok(frame) => apply(frame),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Drain anything queued before shutdown
    while let Ok(frame) = rx.try_recv() {
        apply(frame);
    }

    info!("Ingest thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumachain_core::{ChannelLayout, ChannelMapping, Fixture, Pixel};

    #[test]
    fn test_frames_reach_layers() {
        let mut fixture = Fixture::new(2);
        let layer = fixture.add_layer();
        layer
            .add_mapping(ChannelMapping::new(1, 2, ChannelLayout::Rgb, 0))
            .unwrap();
        let router = Arc::new(UniverseRouter::new());
        router.register_fixture(&fixture);

        let mut worker = IngestWorker::spawn(router).unwrap();
        let sender = worker.sender();
        assert!(sender
            .send(UniverseFrame::new(1, vec![1, 2, 3, 4, 5, 6]))
            .unwrap());
        worker.stop();

        assert!(!worker.is_running());
        assert_eq!(worker.stats().frames_received, 1);
        assert_eq!(worker.stats().mappings_applied, 1);
        assert_eq!(layer.snapshot()[1], Pixel::new(0, 4, 5, 6));
    }

    #[test]
    fn test_oversized_frame_refused() {
        let worker = IngestWorker::spawn(Arc::new(UniverseRouter::new())).unwrap();
        let err = worker
            .sender()
            .send(UniverseFrame::new(0, vec![0; UNIVERSE_SIZE + 1]))
            .unwrap_err();
        assert!(matches!(err, ControlError::OversizedFrame { .. }));
    }

    #[test]
    fn test_send_after_stop_is_disconnected() {
        let mut worker = IngestWorker::spawn(Arc::new(UniverseRouter::new())).unwrap();
        let sender = worker.sender();
        worker.stop();
        drop(worker);
        assert!(matches!(
            sender.send(UniverseFrame::new(0, vec![1])),
            Err(ControlError::Disconnected)
        ));
    }
}
