//! Error types for chain output

use lumachain_core::{CoreError, Protocol};
use thiserror::Error;

/// Output errors
#[derive(Error, Debug)]
pub enum OutputError {
    /// Fixtures were added or removed since the last layout pass
    #[error("Chain layout is stale; call recompute_chain first")]
    StaleLayout,

    #[error("Fixture '{fixture}' expects {fixture_protocol} but controller speaks {controller_protocol}")]
    ProtocolMismatch {
        fixture: String,
        fixture_protocol: Protocol,
        controller_protocol: Protocol,
    },

    #[error("No fixture at index {0}")]
    FixtureNotFound(usize),

    /// Chain membership cannot change while output is running
    #[error("Controller '{0}' is running")]
    ControllerRunning(String),

    /// The physical output rejected a write
    #[error("Sink error: {0}")]
    Sink(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type Result<T> = std::result::Result<T, OutputError>;
