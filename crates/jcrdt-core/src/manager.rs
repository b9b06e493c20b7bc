//! CRDT Manager - operation factories and the admission gate

use crate::crdt::LastWriteWins;
use crate::error::Result;
use crate::operation::{Operation, OperationManager, OperationType, Status, Timestamp};
use crate::patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Façade over a single document's operation log
///
/// Equality and hashing follow the managed CRDT, so two managers compare
/// equal when their effective operation sets match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrdtManager {
    crdt: LastWriteWins,
}

impl CrdtManager {
    /// Create a manager with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager seeded with a deep copy of `crdt`
    pub fn with_crdt(crdt: &LastWriteWins) -> Self {
        Self { crdt: crdt.clone() }
    }

    pub fn crdt(&self) -> &LastWriteWins {
        &self.crdt
    }

    pub fn is_created(&self) -> bool {
        self.crdt.is_created()
    }

    pub fn is_read(&self) -> bool {
        self.crdt.is_read()
    }

    pub fn is_updated(&self) -> bool {
        self.crdt.is_updated()
    }

    pub fn is_deleted(&self) -> bool {
        self.crdt.is_deleted()
    }

    pub fn is_logically_deleted(&self) -> bool {
        self.crdt.is_logically_deleted()
    }

    /// Clear all of the operations in the CRDT
    pub fn clear(&mut self) {
        self.crdt.clear();
    }

    /// Route an operation into the log according to its status.
    ///
    /// Approved and pending operations are added, rejected ones are
    /// tombstoned, anything else is ignored. Returns whether the log changed.
    pub fn push(&mut self, envelope: OperationManager) -> bool {
        let status = envelope.status().clone();
        let op = envelope.into_operation();

        match status {
            Status::Approved | Status::Pending => {
                debug!(%status, kind = %op.kind(), timestamp = op.timestamp(), "Adding operation");
                self.crdt.add_operation(op)
            }
            Status::Rejected => {
                debug!(kind = %op.kind(), timestamp = op.timestamp(), "Tombstoning operation");
                self.crdt.rem_operation(op)
            }
            Status::Unknown(_) => {
                debug!(%status, kind = %op.kind(), timestamp = op.timestamp(), "Ignoring operation with unknown status");
                false
            }
        }
    }

    /// Union another replica's log into this one
    pub fn merge(&mut self, other: &CrdtManager) {
        self.crdt.merge(&other.crdt);
    }

    pub fn reconstruct(&self, base: &Value) -> Result<Value> {
        self.crdt.reconstruct(base)
    }

    pub fn document(&self) -> Result<Value> {
        self.crdt.document()
    }

    pub fn live_document(&self, base: &Value) -> Result<Option<Value>> {
        self.crdt.live_document(base)
    }

    pub fn generate_create(timestamp: Timestamp) -> Operation {
        Operation::marker(OperationType::Create, timestamp)
    }

    pub fn generate_read(timestamp: Timestamp) -> Operation {
        Operation::marker(OperationType::Read, timestamp)
    }

    /// Diff `source` against `target` and wrap the patch as an UPDATE.
    ///
    /// Equal documents produce an empty patch; the result is still a regular
    /// update and marks the document as updated once admitted.
    pub fn generate_update(source: &Value, target: &Value, timestamp: Timestamp) -> Result<Operation> {
        Operation::update(patch::compute_patch(source, target), timestamp)
    }

    pub fn generate_delete(timestamp: Timestamp) -> Operation {
        Operation::marker(OperationType::Delete, timestamp)
    }
}

impl From<LastWriteWins> for CrdtManager {
    fn from(crdt: LastWriteWins) -> Self {
        Self { crdt }
    }
}
