//! Codec error types

use thiserror::Error;

/// Encoding and decoding errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Message too large: {size} > {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Batch for {object_id} contains no operations")]
    EmptyBatch { object_id: uuid::Uuid },
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
