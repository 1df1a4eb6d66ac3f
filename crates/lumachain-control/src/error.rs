//! Error types for universe ingestion
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// I/O error (thread spawn)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The ingest worker is no longer accepting frames
    #[error("Ingest worker disconnected")]
    Disconnected,

    /// A universe frame carried more channels than a universe holds
    #[error("Universe {universe} frame has {len} channels (max {max})")]
    OversizedFrame { universe: u16, len: usize, max: usize },
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
