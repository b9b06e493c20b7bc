//! Simulated replica holding one manager per object

use crate::manager::SimManager;
use jcrdt_codec::OperationBatch;
use jcrdt_core::DocumentManager;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::trace;
use uuid::Uuid;

/// A replica's datastore
///
/// Managers are keyed by object id; a separate id list keeps insertion order
/// for uniform random selection.
#[derive(Debug, Clone)]
pub struct Node {
    id: Uuid,
    datastore: BTreeMap<Uuid, SimManager>,
    crdt_ids: Vec<Uuid>,
}

impl Node {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            datastore: BTreeMap::new(),
            crdt_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn datastore(&self) -> &BTreeMap<Uuid, SimManager> {
        &self.datastore
    }

    pub fn crdt_ids(&self) -> &[Uuid] {
        &self.crdt_ids
    }

    pub fn len(&self) -> usize {
        self.datastore.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datastore.is_empty()
    }

    /// Register `manager` under its own object id, replacing any previous one.
    pub fn add_crdt(&mut self, manager: SimManager) {
        let id = manager.object_id();
        if self.datastore.insert(id, manager).is_none() {
            self.crdt_ids.push(id);
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&SimManager> {
        self.datastore.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut SimManager> {
        self.datastore.get_mut(id)
    }

    /// Manager for `id`, registering an empty one first if unknown
    pub fn get_or_create(&mut self, id: Uuid) -> &mut SimManager {
        if !self.datastore.contains_key(&id) {
            self.crdt_ids.push(id);
        }
        self.datastore
            .entry(id)
            .or_insert_with(|| SimManager::new(id))
    }

    pub fn pick_crdt_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Uuid> {
        self.crdt_ids.choose(rng).copied()
    }

    pub fn pick_crdt<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&SimManager> {
        self.pick_crdt_id(rng).and_then(|id| self.datastore.get(&id))
    }

    /// Push every envelope of `batch` into the matching manager.
    ///
    /// Returns how many envelopes changed the log.
    pub fn deliver(&mut self, batch: &OperationBatch) -> usize {
        let node = self.id;
        let manager = self.get_or_create(batch.object_id);
        let changed = batch.apply_to(manager.manager_mut());

        trace!(
            %node,
            origin = %batch.origin,
            object = %batch.object_id,
            entries = batch.len(),
            changed,
            "Delivered batch"
        );
        changed
    }

    /// Union every log held by `other` into this node.
    pub fn merge_from(&mut self, other: &Node) {
        for (id, manager) in &other.datastore {
            self.get_or_create(*id).merge(manager);
        }
    }

    /// Clear every managed CRDT, then forget them.
    pub fn clear(&mut self) {
        for manager in self.datastore.values_mut() {
            manager.clear();
        }
        self.datastore.clear();
        self.crdt_ids.clear();
    }
}
