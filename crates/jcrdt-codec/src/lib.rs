//! JCRDT Codec - structured encodings for logs, managers, and batches
//!
//! Every core type is `serde`-serializable; this crate picks the concrete
//! format and carries the batch envelope replicas exchange.
//!
//! ## Formats
//! ```text
//! json          # human-readable, default
//! message-pack  # compact binary, structs encoded as maps
//! ```

pub mod batch;
pub mod codec;
pub mod error;

pub use batch::OperationBatch;
pub use codec::{Codec, Format, MAX_MESSAGE_SIZE};
pub use error::{CodecError, CodecResult};
