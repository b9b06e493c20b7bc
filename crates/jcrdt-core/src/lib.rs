//! JCRDT Core - Last-Write-Wins CRDT engine for JSON documents
//!
//! This crate provides the core functionality for JCRDT:
//! - Immutable operations and their admission envelopes
//! - The add/remove operation log with timestamp-ordered replay
//! - Managers that route operations into the log and expose document state

pub mod crdt;
pub mod document;
pub mod error;
pub mod manager;
pub mod operation;
pub mod patch;
pub mod sync;

pub use crdt::{empty_document, LastWriteWins};
pub use document::{AnyManager, DocumentManager, JsonManager, TypedManager};
pub use error::{Error, Result};
pub use manager::CrdtManager;
pub use operation::{Operation, OperationManager, OperationType, Status, Timestamp};
pub use patch::Patch;
pub use sync::SharedManager;
