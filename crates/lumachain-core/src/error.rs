//! Error types for the pixel model
use thiserror::Error;

/// Errors raised while configuring or feeding layers and fixtures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A channel mapping would share pixels with one already on the layer
    #[error("Mapping for pixels {start}..{end} overlaps an existing mapping on this layer")]
    MappingOverlap { start: usize, end: usize },

    /// A channel mapping reaches past the end of its layer
    #[error("Mapping for pixels {start}..{end} exceeds layer length {len}")]
    MappingOutOfRange { start: usize, end: usize, len: usize },

    /// A channel mapping reads past the end of a universe
    #[error("Mapping reads {len} channels from channel {start}; a universe holds {max}")]
    ChannelsOutOfRange { start: usize, len: usize, max: usize },

    /// A direct write started outside the layer
    #[error("Index {index} exceeds layer length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Only RGB (3) and ARGB (4) channel groups are understood
    #[error("Invalid channels per pixel: {0} (expected 3 or 4)")]
    InvalidChannelsPerPixel(u8),

    /// A universe buffer was too short for the mapping reading it
    #[error("Universe {universe} delivered {actual} channels, mapping needs {expected}")]
    TruncatedInput {
        universe: u16,
        expected: usize,
        actual: usize,
    },
}

impl CoreError {
    /// Whether this error belongs to the configuration class (raised eagerly
    /// when a mapping or write is set up, never while frames are flowing)
    pub fn is_configuration(&self) -> bool {
        !matches!(self, CoreError::TruncatedInput { .. })
    }
}

/// Result type for pixel model operations
pub type Result<T> = std::result::Result<T, CoreError>;
