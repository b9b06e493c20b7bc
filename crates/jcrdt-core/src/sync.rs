//! Shared manager for multi-threaded access

use crate::error::Result;
use crate::manager::CrdtManager;
use crate::operation::OperationManager;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// A `CrdtManager` behind a single lock
///
/// Every mutation takes the write lock; reconstruction and predicates take
/// the read lock, so a replay always sees one consistent log.
#[derive(Debug, Clone, Default)]
pub struct SharedManager {
    inner: Arc<RwLock<CrdtManager>>,
}

impl SharedManager {
    pub fn new(manager: CrdtManager) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    pub fn push(&self, envelope: OperationManager) -> bool {
        self.inner.write().push(envelope)
    }

    pub fn merge_from(&self, other: &CrdtManager) {
        self.inner.write().merge(other);
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn is_created(&self) -> bool {
        self.inner.read().is_created()
    }

    pub fn is_read(&self) -> bool {
        self.inner.read().is_read()
    }

    pub fn is_updated(&self) -> bool {
        self.inner.read().is_updated()
    }

    pub fn is_deleted(&self) -> bool {
        self.inner.read().is_deleted()
    }

    pub fn document(&self) -> Result<Value> {
        self.inner.read().document()
    }

    pub fn live_document(&self, base: &Value) -> Result<Option<Value>> {
        self.inner.read().live_document(base)
    }

    /// Copy of the current manager state
    pub fn snapshot(&self) -> CrdtManager {
        self.inner.read().clone()
    }
}
