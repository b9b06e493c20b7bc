//! Typed document managers

use crate::crdt::empty_document;
use crate::error::Result;
use crate::manager::CrdtManager;
use crate::operation::{Operation, OperationManager, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Capability of a manager whose log describes a document of type `T`
pub trait DocumentManager<T> {
    fn manager(&self) -> &CrdtManager;

    fn manager_mut(&mut self) -> &mut CrdtManager;

    /// Document the log is replayed on
    fn base(&self) -> Value {
        empty_document()
    }

    /// Current document, or `None` while uncreated or logically deleted
    fn document(&self) -> Result<Option<T>>;

    /// Record the change from the current document to `target` and admit it.
    fn apply_update(&mut self, target: &T, timestamp: Timestamp) -> Result<Operation>;

    fn push(&mut self, envelope: OperationManager) -> bool {
        self.manager_mut().push(envelope)
    }

    fn create(&mut self, timestamp: Timestamp) -> Operation {
        let op = CrdtManager::generate_create(timestamp);
        self.push(OperationManager::approved(op.clone()));
        op
    }

    fn read(&mut self, timestamp: Timestamp) -> Operation {
        let op = CrdtManager::generate_read(timestamp);
        self.push(OperationManager::approved(op.clone()));
        op
    }

    fn delete(&mut self, timestamp: Timestamp) -> Operation {
        let op = CrdtManager::generate_delete(timestamp);
        self.push(OperationManager::approved(op.clone()));
        op
    }
}

/// Manager for any serde-representable payload
///
/// The payload is converted to JSON at the boundary; the log only ever
/// stores JSON patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TypedManager<T> {
    manager: CrdtManager,
    #[serde(default = "empty_document")]
    base: Value,
    #[serde(skip)]
    payload: PhantomData<fn() -> T>,
}

/// Manager over raw JSON values
pub type JsonManager = TypedManager<Value>;

impl<T> TypedManager<T> {
    pub fn new() -> Self {
        Self::with_base(empty_document())
    }

    /// Replay on `base` instead of the empty object
    pub fn with_base(base: Value) -> Self {
        Self {
            manager: CrdtManager::new(),
            base,
            payload: PhantomData,
        }
    }

    pub fn from_manager(manager: CrdtManager) -> Self {
        Self {
            manager,
            base: empty_document(),
            payload: PhantomData,
        }
    }

    pub fn into_manager(self) -> CrdtManager {
        self.manager
    }
}

impl<T> Default for TypedManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for TypedManager<T> {
    fn eq(&self, other: &Self) -> bool {
        self.manager == other.manager && self.base == other.base
    }
}

impl<T> Eq for TypedManager<T> {}

impl<T> Hash for TypedManager<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.manager.hash(state);
        self.base.hash(state);
    }
}

impl<T: Serialize + DeserializeOwned> DocumentManager<T> for TypedManager<T> {
    fn manager(&self) -> &CrdtManager {
        &self.manager
    }

    fn manager_mut(&mut self) -> &mut CrdtManager {
        &mut self.manager
    }

    fn base(&self) -> Value {
        self.base.clone()
    }

    fn document(&self) -> Result<Option<T>> {
        match self.manager.live_document(&self.base)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn apply_update(&mut self, target: &T, timestamp: Timestamp) -> Result<Operation> {
        let target = serde_json::to_value(target)?;
        let current = self.manager.reconstruct(&self.base)?;
        let op = CrdtManager::generate_update(&current, &target, timestamp)?;

        self.manager.push(OperationManager::approved(op.clone()));
        Ok(op)
    }
}

/// Manager variants distinguished by an explicit `type` field when encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnyManager {
    CrdtManager(CrdtManager),
    JsonManager(JsonManager),
}

impl AnyManager {
    pub fn manager(&self) -> &CrdtManager {
        match self {
            AnyManager::CrdtManager(manager) => manager,
            AnyManager::JsonManager(json) => json.manager(),
        }
    }
}
