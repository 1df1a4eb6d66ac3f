//! Lumachain - layered LED compositing and chain output
//!
//! Application crate: configuration loading, logging setup and rig assembly
//! on top of `lumachain-core`, `lumachain-control` and `lumachain-render`.

pub mod config;
pub mod logging_setup;
pub mod rig;

pub use config::{LogConfig, RigConfig};
pub use rig::{Rig, RigOutput};
