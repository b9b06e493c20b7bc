//! Error types for JCRDT Core

use crate::operation::{OperationType, Timestamp};
use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed {kind} operation: {reason}")]
    MalformedOperation {
        kind: OperationType,
        reason: &'static str,
    },

    #[error("Failed to apply update at timestamp {timestamp}: {source}")]
    Patch {
        timestamp: Timestamp,
        #[source]
        source: json_patch::PatchError,
    },

    #[error("Payload conversion failed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result type alias for JCRDT Core operations
pub type Result<T> = std::result::Result<T, Error>;
