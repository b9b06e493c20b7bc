//! Operations and their admission envelopes

use crate::error::{Error, Result};
use crate::patch::{self, Patch};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Effective time of an operation. Ties between replicas are possible.
pub type Timestamp = u64;

/// Kind of document mutation an operation expresses
///
/// The declaration order doubles as the precedence used when two operations
/// share a timestamp: a DELETE sorts after everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Create => write!(f, "CREATE"),
            OperationType::Read => write!(f, "READ"),
            OperationType::Update => write!(f, "UPDATE"),
            OperationType::Delete => write!(f, "DELETE"),
        }
    }
}

/// An immutable document mutation intent
///
/// Only UPDATE operations carry a patch. Identity is the triple of type,
/// timestamp, and patch content; the canonical patch text is computed once at
/// construction and used for equality, hashing, and ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WireOperation", into = "WireOperation")]
pub struct Operation {
    kind: OperationType,
    timestamp: Timestamp,
    patch: Option<Patch>,
    digest: String,
}

impl Operation {
    /// Build an operation, rejecting a patch on non-UPDATE kinds and a missing
    /// patch on UPDATE.
    pub fn new(kind: OperationType, timestamp: Timestamp, patch: Option<Patch>) -> Result<Self> {
        match (kind, patch) {
            (OperationType::Update, Some(patch)) => {
                let digest = patch::canonical_text(&patch)?;
                Ok(Self {
                    kind,
                    timestamp,
                    patch: Some(patch),
                    digest,
                })
            }
            (OperationType::Update, None) => Err(Error::MalformedOperation {
                kind,
                reason: "an update must carry a patch",
            }),
            (_, Some(_)) => Err(Error::MalformedOperation {
                kind,
                reason: "only updates may carry a patch",
            }),
            (_, None) => Ok(Self::marker(kind, timestamp)),
        }
    }

    /// Patch-free operation; callers guarantee `kind` is not UPDATE.
    pub(crate) fn marker(kind: OperationType, timestamp: Timestamp) -> Self {
        debug_assert_ne!(kind, OperationType::Update);
        Self {
            kind,
            timestamp,
            patch: None,
            digest: String::new(),
        }
    }

    /// Wrap an already computed patch as an UPDATE.
    pub fn update(patch: Patch, timestamp: Timestamp) -> Result<Self> {
        Self::new(OperationType::Update, timestamp, Some(patch))
    }

    pub fn kind(&self) -> OperationType {
        self.kind
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn patch(&self) -> Option<&Patch> {
        self.patch.as_ref()
    }

    /// Canonical patch text, empty for patch-free operations
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn is(&self, kind: OperationType) -> bool {
        self.kind == kind
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Operation {}

impl PartialOrd for Operation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Timestamp first, then type precedence, then canonical patch text.
impl Ord for Operation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.kind.cmp(&other.kind))
            .then_with(|| self.digest.cmp(&other.digest))
    }
}

impl Hash for Operation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.timestamp.hash(state);
        self.kind.hash(state);
        self.digest.hash(state);
    }
}

/// Serialized shape of an operation
#[derive(Serialize, Deserialize)]
struct WireOperation {
    #[serde(rename = "type")]
    kind: OperationType,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patch: Option<Patch>,
}

impl TryFrom<WireOperation> for Operation {
    type Error = Error;

    fn try_from(wire: WireOperation) -> Result<Self> {
        Operation::new(wire.kind, wire.timestamp, wire.patch)
    }
}

impl From<Operation> for WireOperation {
    fn from(op: Operation) -> Self {
        WireOperation {
            kind: op.kind,
            timestamp: op.timestamp,
            patch: op.patch,
        }
    }
}

/// Admission status assigned to an operation by an external process
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
    /// A status this version does not recognise, kept verbatim for relaying
    Unknown(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "PENDING",
            Status::Approved => "APPROVED",
            Status::Rejected => "REJECTED",
            Status::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.to_uppercase().as_str() {
            "PENDING" => Status::Pending,
            "APPROVED" => Status::Approved,
            "REJECTED" => Status::Rejected,
            _ => Status::Unknown(s),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Routing envelope pairing an operation with its admission status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationManager {
    status: Status,
    operation: Operation,
}

impl OperationManager {
    pub fn new(status: Status, operation: Operation) -> Self {
        Self { status, operation }
    }

    pub fn pending(operation: Operation) -> Self {
        Self::new(Status::Pending, operation)
    }

    pub fn approved(operation: Operation) -> Self {
        Self::new(Status::Approved, operation)
    }

    pub fn rejected(operation: Operation) -> Self {
        Self::new(Status::Rejected, operation)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn into_operation(self) -> Operation {
        self.operation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> Patch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_update_requires_patch() {
        let err = Operation::new(OperationType::Update, 1, None).unwrap_err();
        assert!(matches!(err, Error::MalformedOperation { kind: OperationType::Update, .. }));
    }

    #[test]
    fn test_non_update_rejects_patch() {
        let p = patch(json!([{"op": "add", "path": "/a", "value": 1}]));
        for kind in [OperationType::Create, OperationType::Read, OperationType::Delete] {
            assert!(Operation::new(kind, 1, Some(p.clone())).is_err());
        }
    }

    #[test]
    fn test_equality_covers_type_timestamp_and_patch() {
        let a = Operation::new(OperationType::Create, 3, None).unwrap();
        assert_eq!(a, Operation::new(OperationType::Create, 3, None).unwrap());
        assert_ne!(a, Operation::new(OperationType::Create, 4, None).unwrap());
        assert_ne!(a, Operation::new(OperationType::Read, 3, None).unwrap());

        let u1 = Operation::update(patch(json!([{"op": "add", "path": "/a", "value": 1}])), 3).unwrap();
        let u2 = Operation::update(patch(json!([{"op": "add", "path": "/a", "value": 2}])), 3).unwrap();
        assert_ne!(u1, u2);
    }

    #[test]
    fn test_digest_is_canonical_patch_text() {
        let marker = Operation::new(OperationType::Delete, 2, None).unwrap();
        assert_eq!(marker.digest(), "");

        let a = Operation::update(patch(json!([{"op": "add", "path": "/a", "value": {"y": 1, "x": 2}}])), 2).unwrap();
        let b = Operation::update(patch(json!([{"value": {"x": 2, "y": 1}, "path": "/a", "op": "add"}])), 2).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a, b);
    }

    #[test]
    fn test_delete_sorts_after_same_time_update() {
        let update = Operation::update(patch(json!([])), 5).unwrap();
        let delete = Operation::new(OperationType::Delete, 5, None).unwrap();
        assert!(delete > update);
    }

    #[test]
    fn test_wire_shape() {
        let op = Operation::new(OperationType::Read, 9, None).unwrap();
        let encoded = serde_json::to_value(&op).unwrap();
        assert_eq!(encoded, json!({"type": "READ", "timestamp": 9}));
    }

    #[test]
    fn test_decoding_malformed_operation_fails() {
        let result: std::result::Result<Operation, _> =
            serde_json::from_value(json!({"type": "UPDATE", "timestamp": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_status_decodes() {
        let status: Status = serde_json::from_value(json!("ESCALATED")).unwrap();
        assert_eq!(status, Status::Unknown("ESCALATED".into()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("ESCALATED"));
        let status: Status = serde_json::from_value(json!("APPROVED")).unwrap();
        assert_eq!(status, Status::Approved);
    }
}
