//! Error types for the simulation harness

use std::path::PathBuf;
use thiserror::Error;

/// Simulation error types
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Core error: {0}")]
    Core(#[from] jcrdt_core::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] jcrdt_codec::CodecError),
}

/// Result type alias for simulation operations
pub type SimResult<T> = std::result::Result<T, SimError>;
