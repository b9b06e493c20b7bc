//! Last-write-wins CRDT over an add/remove operation log
//!
//! The log is two grow-only sets. An operation present in the remove set is a
//! tombstone: it never takes part in replay, whichever set it reached first.
//! Merging two replicas is the union of their add sets and of their remove
//! sets, which makes merge commutative, associative, and idempotent.
//!
//! Document state is never cached. Every query walks the effective set
//! (`added - removed`), so it always reflects the latest log contents.

use crate::error::{Error, Result};
use crate::operation::{Operation, OperationType, Timestamp};
use crate::patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use tracing::trace;

/// Base document used when the caller does not supply one
pub fn empty_document() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Operation log with last-write-wins replay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastWriteWins {
    #[serde(default)]
    add_operations: BTreeSet<Operation>,
    #[serde(default)]
    remove_operations: BTreeSet<Operation>,
}

impl LastWriteWins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert into the add set. Returns `false` when already present.
    pub fn add_operation(&mut self, op: Operation) -> bool {
        self.add_operations.insert(op)
    }

    /// Insert into the remove set. The operation need not have been added.
    pub fn rem_operation(&mut self, op: Operation) -> bool {
        self.remove_operations.insert(op)
    }

    pub fn added(&self) -> &BTreeSet<Operation> {
        &self.add_operations
    }

    pub fn removed(&self) -> &BTreeSet<Operation> {
        &self.remove_operations
    }

    /// Added and not removed, in replay order
    pub fn effective_operations(&self) -> impl Iterator<Item = &Operation> {
        self.add_operations.difference(&self.remove_operations)
    }

    /// Number of operations in the effective set
    pub fn len(&self) -> usize {
        self.effective_operations().count()
    }

    pub fn is_empty(&self) -> bool {
        self.effective_operations().next().is_none()
    }

    /// Total entries across both sets, tombstones included
    pub fn log_len(&self) -> usize {
        self.add_operations.len() + self.remove_operations.len()
    }

    pub fn contains(&self, kind: OperationType) -> bool {
        self.effective_operations().any(|op| op.is(kind))
    }

    pub fn is_created(&self) -> bool {
        self.contains(OperationType::Create)
    }

    pub fn is_read(&self) -> bool {
        self.contains(OperationType::Read)
    }

    pub fn is_updated(&self) -> bool {
        self.contains(OperationType::Update)
    }

    pub fn is_deleted(&self) -> bool {
        self.contains(OperationType::Delete)
    }

    /// Latest effective timestamp among operations of the given kinds
    pub fn latest(&self, kinds: &[OperationType]) -> Option<Timestamp> {
        self.effective_operations()
            .filter(|op| kinds.contains(&op.kind()))
            .map(Operation::timestamp)
            .max()
    }

    /// True when a DELETE is at least as recent as every CREATE and UPDATE.
    ///
    /// Decided on timestamps alone; a DELETE wins a tie.
    pub fn is_logically_deleted(&self) -> bool {
        let deleted_at = self.latest(&[OperationType::Delete]);
        let written_at = self.latest(&[OperationType::Create, OperationType::Update]);

        match (deleted_at, written_at) {
            (Some(deleted), Some(written)) => deleted >= written,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Effective updates sorted by timestamp, ties broken by patch text
    pub fn updates(&self) -> impl Iterator<Item = &Operation> {
        self.effective_operations()
            .filter(|op| op.is(OperationType::Update))
    }

    /// Replay every effective update on top of `base`.
    ///
    /// A failure is scoped to this call; the log itself is never touched.
    pub fn reconstruct(&self, base: &Value) -> Result<Value> {
        let mut document = base.clone();

        for op in self.updates() {
            let Some(patch) = op.patch() else {
                continue;
            };
            trace!(timestamp = op.timestamp(), steps = patch.0.len(), "Replaying update");
            document = patch::apply_patch(&document, patch).map_err(|source| Error::Patch {
                timestamp: op.timestamp(),
                source,
            })?;
        }

        Ok(document)
    }

    /// Replay on the empty object
    pub fn document(&self) -> Result<Value> {
        self.reconstruct(&empty_document())
    }

    /// The document as a reader sees it: `None` until something has been
    /// created or written, and again once a DELETE dominates.
    pub fn live_document(&self, base: &Value) -> Result<Option<Value>> {
        if !(self.is_created() || self.is_updated()) || self.is_logically_deleted() {
            return Ok(None);
        }
        self.reconstruct(base).map(Some)
    }

    /// Union both sets of `other` into this log.
    pub fn merge(&mut self, other: &LastWriteWins) {
        self.add_operations
            .extend(other.add_operations.iter().cloned());
        self.remove_operations
            .extend(other.remove_operations.iter().cloned());
    }

    /// Reset to the uncreated state.
    pub fn clear(&mut self) {
        self.add_operations.clear();
        self.remove_operations.clear();
    }
}

/// Equal when the effective sets are equal, regardless of tombstone history.
impl PartialEq for LastWriteWins {
    fn eq(&self, other: &Self) -> bool {
        self.effective_operations().eq(other.effective_operations())
    }
}

impl Eq for LastWriteWins {}

impl Hash for LastWriteWins {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for op in self.effective_operations() {
            op.hash(state);
        }
    }
}
