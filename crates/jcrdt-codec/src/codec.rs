//! Format selection and size-limited encoding

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default limit on a single encoded message (16MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Structured encoding used on the wire or at rest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    #[default]
    Json,
    MessagePack,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::MessagePack => write!(f, "message-pack"),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "message-pack" | "msgpack" | "mp" => Ok(Format::MessagePack),
            _ => Err(CodecError::UnknownFormat(s.to_string())),
        }
    }
}

/// Encoder/decoder bound to one format and a size limit
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    format: Format,
    max_message_size: usize,
}

impl Codec {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let bytes = match self.format {
            Format::Json => serde_json::to_vec(value)?,
            // Named encoding keeps structs as maps, which tagged enums need.
            Format::MessagePack => rmp_serde::to_vec_named(value)?,
        };
        self.check_size(bytes.len())?;
        trace!(format = %self.format, size = bytes.len(), "Encoded message");
        Ok(bytes)
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> CodecResult<T> {
        self.check_size(bytes.len())?;
        let value: T = match self.format {
            Format::Json => serde_json::from_slice(bytes)?,
            Format::MessagePack => rmp_serde::from_slice(bytes)?,
        };
        Ok(value)
    }

    fn check_size(&self, size: usize) -> CodecResult<()> {
        if size > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size,
                max: self.max_message_size,
            });
        }
        Ok(())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(Format::default())
    }
}
