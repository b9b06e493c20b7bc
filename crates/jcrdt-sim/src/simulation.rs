//! Randomised multi-replica runs
//!
//! Each round every replica issues operations against its own managers,
//! pending operations are then approved or rejected by their origin, and
//! finally all envelopes are exchanged in shuffled order (optionally through
//! the wire codec, optionally duplicated). Once the last exchange is done
//! every replica must hold the same effective logs and documents.

use crate::config::SimConfig;
use crate::data::{Payload, PayloadKind};
use crate::error::SimResult;
use crate::manager::SimManager;
use crate::node::Node;
use jcrdt_codec::{Codec, OperationBatch};
use jcrdt_core::{CrdtManager, DocumentManager, Operation, OperationManager, Status, Timestamp};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::{Builder, Uuid};

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimReport {
    pub seed: u64,
    pub nodes: usize,
    pub objects: usize,
    pub rounds: usize,
    /// Operations issued by replicas, seeding included
    pub operations: usize,
    /// Steps that found nothing to act on
    pub idle_steps: usize,
    /// Updates abandoned because the local document could not be replayed
    pub skipped_updates: usize,
    pub rejected: usize,
    pub deliveries: usize,
    pub duplicates: usize,
    pub live_documents: usize,
    pub deleted_documents: usize,
    pub unreadable_documents: usize,
    pub converged: bool,
}

struct Outgoing {
    origin: usize,
    object_id: Uuid,
    envelope: OperationManager,
}

struct Decision {
    origin: usize,
    object_id: Uuid,
    operation: Operation,
}

pub struct Simulation {
    config: SimConfig,
    rng: StdRng,
    nodes: Vec<Node>,
    kinds: BTreeMap<Uuid, PayloadKind>,
    clock: Timestamp,
    outbox: Vec<Outgoing>,
    undecided: Vec<Decision>,
    codec: Option<Codec>,
    report: SimReport,
}

/// Version-4 id drawn from the simulation's random source
pub fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    Builder::from_random_bytes(rng.gen()).into_uuid()
}

impl Simulation {
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let nodes = (0..config.nodes)
            .map(|_| Node::new(random_uuid(&mut rng)))
            .collect();
        let report = SimReport {
            seed: config.seed,
            nodes: config.nodes,
            objects: config.objects,
            rounds: config.rounds,
            ..SimReport::default()
        };

        Ok(Self {
            codec: config.wire_format.map(Codec::new),
            config,
            rng,
            nodes,
            kinds: BTreeMap::new(),
            clock: 0,
            outbox: Vec::new(),
            undecided: Vec::new(),
            report,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn report(&self) -> &SimReport {
        &self.report
    }

    /// Seed, run every round, and settle all outstanding traffic.
    pub fn run(&mut self) -> SimResult<SimReport> {
        info!(
            seed = self.config.seed,
            nodes = self.config.nodes,
            objects = self.config.objects,
            rounds = self.config.rounds,
            "Starting simulation"
        );
        if let Some(codec) = &self.codec {
            info!(format = %codec.format(), "Exchanging batches through the wire codec");
        }

        self.seed_objects()?;
        self.exchange()?;

        for round in 0..self.config.rounds {
            for _ in 0..self.config.operations_per_round {
                self.step()?;
            }
            self.admit();
            self.exchange()?;
            debug!(round, clock = self.clock, "Round complete");
        }

        self.summarise();
        info!(
            operations = self.report.operations,
            rejected = self.report.rejected,
            deliveries = self.report.deliveries,
            converged = self.report.converged,
            "Simulation finished"
        );
        Ok(self.report.clone())
    }

    fn tick(&mut self) -> Timestamp {
        if self.rng.gen_bool(self.config.clock_advance_probability) {
            self.clock += 1;
        }
        self.clock
    }

    fn send(&mut self, origin: usize, object_id: Uuid, envelope: OperationManager) {
        self.outbox.push(Outgoing {
            origin,
            object_id,
            envelope,
        });
    }

    /// Create every object on a random origin with an initial payload.
    pub fn seed_objects(&mut self) -> SimResult<()> {
        for _ in 0..self.config.objects {
            let origin = self.rng.gen_range(0..self.nodes.len());
            let object_id = random_uuid(&mut self.rng);
            let kind = PayloadKind::ALL[self.rng.gen_range(0..PayloadKind::ALL.len())];
            let payload = Payload::random(kind, &mut self.rng);

            let mut manager = SimManager::new(object_id);
            let created = manager.create(self.tick());
            let initial = manager.apply_update(&payload, self.tick())?;

            self.nodes[origin].add_crdt(manager);
            self.kinds.insert(object_id, payload.kind());
            self.send(origin, object_id, OperationManager::approved(created));
            self.send(origin, object_id, OperationManager::approved(initial));
            self.report.operations += 2;

            debug!(node = %self.nodes[origin].id(), object = %object_id, ?kind, "Seeded object");
        }
        Ok(())
    }

    /// Issue one random operation on a random replica.
    pub fn step(&mut self) -> SimResult<()> {
        let origin = self.rng.gen_range(0..self.nodes.len());
        let Some(object_id) = self.nodes[origin].pick_crdt_id(&mut self.rng) else {
            self.report.idle_steps += 1;
            return Ok(());
        };

        let timestamp = self.tick();
        let total = self.config.read_weight + self.config.update_weight + self.config.delete_weight;
        let roll = self.rng.gen_range(0..total);

        let operation = if roll < self.config.read_weight {
            CrdtManager::generate_read(timestamp)
        } else if roll < self.config.read_weight + self.config.update_weight {
            match self.propose_update(origin, object_id, timestamp)? {
                Some(op) => op,
                None => {
                    self.report.skipped_updates += 1;
                    return Ok(());
                }
            }
        } else {
            CrdtManager::generate_delete(timestamp)
        };

        let pending = self.rng.gen_bool(self.config.pending_probability);
        let envelope = if pending {
            OperationManager::pending(operation.clone())
        } else {
            OperationManager::approved(operation.clone())
        };

        if let Some(manager) = self.nodes[origin].get_mut(&object_id) {
            manager.push(envelope.clone());
        }
        self.send(origin, object_id, envelope);
        if pending {
            self.undecided.push(Decision {
                origin,
                object_id,
                operation,
            });
        }
        self.report.operations += 1;
        Ok(())
    }

    /// Diff the replica's current view against a mutated payload.
    ///
    /// A replica that has not yet seen any payload for the object starts from
    /// a fresh one of the object's kind.
    fn propose_update(
        &mut self,
        origin: usize,
        object_id: Uuid,
        timestamp: Timestamp,
    ) -> SimResult<Option<Operation>> {
        let Some(manager) = self.nodes[origin].get(&object_id) else {
            return Ok(None);
        };

        let current = match manager.manager().reconstruct(&manager.base()) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    node = %self.nodes[origin].id(),
                    object = %object_id,
                    error = %err,
                    "Skipping update on unreadable document"
                );
                return Ok(None);
            }
        };

        let mut payload = match serde_json::from_value::<Payload>(current.clone()) {
            Ok(payload) => payload,
            Err(_) => {
                let kind = self
                    .kinds
                    .get(&object_id)
                    .copied()
                    .unwrap_or(PayloadKind::SimpleA);
                Payload::random(kind, &mut self.rng)
            }
        };
        payload.mutate(self.config.update_probability, &mut self.rng);

        let target = serde_json::to_value(&payload).map_err(jcrdt_core::Error::from)?;
        Ok(Some(CrdtManager::generate_update(&current, &target, timestamp)?))
    }

    /// Approve or reject every pending operation at its origin.
    pub fn admit(&mut self) {
        for decision in std::mem::take(&mut self.undecided) {
            let status = if self.rng.gen_bool(self.config.reject_probability) {
                self.report.rejected += 1;
                Status::Rejected
            } else {
                Status::Approved
            };
            let envelope = OperationManager::new(status, decision.operation);

            if let Some(manager) = self.nodes[decision.origin].get_mut(&decision.object_id) {
                manager.push(envelope.clone());
            }
            self.send(decision.origin, decision.object_id, envelope);
        }
    }

    /// Deliver the outbox to every other replica in random order.
    pub fn exchange(&mut self) -> SimResult<()> {
        let mut grouped: BTreeMap<(usize, Uuid), OperationBatch> = BTreeMap::new();
        for outgoing in std::mem::take(&mut self.outbox) {
            let origin_id = self.nodes[outgoing.origin].id();
            grouped
                .entry((outgoing.origin, outgoing.object_id))
                .or_insert_with(|| OperationBatch::new(origin_id, outgoing.object_id))
                .push(outgoing.envelope);
        }
        let mut batches: Vec<OperationBatch> = grouped.into_values().collect();

        for target in 0..self.nodes.len() {
            let target_id = self.nodes[target].id();
            batches.shuffle(&mut self.rng);

            for batch in &batches {
                if batch.origin == target_id {
                    continue;
                }

                let mut delivered = self.transmit(batch)?;
                let p = self.config.duplicate_probability;
                let extra: Vec<OperationManager> = delivered
                    .entries
                    .iter()
                    .filter(|_| self.rng.gen_bool(p))
                    .cloned()
                    .collect();
                self.report.duplicates += extra.len();
                delivered.entries.extend(extra);
                delivered.entries.shuffle(&mut self.rng);

                self.report.deliveries += delivered.len();
                self.nodes[target].deliver(&delivered);
            }
        }
        Ok(())
    }

    fn transmit(&self, batch: &OperationBatch) -> SimResult<OperationBatch> {
        match &self.codec {
            Some(codec) => Ok(codec.decode_batch(&codec.encode_batch(batch)?)?),
            None => Ok(batch.clone()),
        }
    }

    /// True when every replica holds equal managers and documents for the
    /// same set of objects.
    pub fn is_converged(&self) -> bool {
        let Some((first, rest)) = self.nodes.split_first() else {
            return true;
        };

        rest.iter().all(|node| {
            node.len() == first.len()
                && first.datastore().iter().all(|(id, manager)| {
                    node.get(id)
                        .is_some_and(|other| other == manager && same_document(manager, other))
                })
        })
    }

    fn summarise(&mut self) {
        self.report.converged = self.is_converged();

        if let Some(first) = self.nodes.first() {
            for manager in first.datastore().values() {
                match manager.document() {
                    Ok(Some(_)) => self.report.live_documents += 1,
                    Ok(None) => self.report.deleted_documents += 1,
                    Err(_) => self.report.unreadable_documents += 1,
                }
            }
        }
    }
}

fn same_document(a: &SimManager, b: &SimManager) -> bool {
    match (a.document(), b.document()) {
        (Ok(x), Ok(y)) => x == y,
        (Err(_), Err(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SimConfig {
        SimConfig {
            seed: 21,
            nodes: 3,
            objects: 4,
            rounds: 3,
            operations_per_round: 20,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_seeding_reaches_every_node() {
        let mut sim = Simulation::new(small()).unwrap();
        sim.seed_objects().unwrap();
        sim.exchange().unwrap();

        for node in sim.nodes() {
            assert_eq!(node.len(), 4);
        }
        assert!(sim.is_converged());
    }

    #[test]
    fn test_divergence_before_exchange() {
        let mut sim = Simulation::new(small()).unwrap();
        sim.seed_objects().unwrap();
        assert!(!sim.is_converged());
    }

    #[test]
    fn test_run_converges() {
        let config = small();
        let mut sim = Simulation::new(config.clone()).unwrap();
        let report = sim.run().unwrap();
        assert!(report.converged);
        assert!(report.operations >= 8);
        assert_eq!(sim.report(), &report);

        // The clock only moves on ticks: two per seeded object, one per step.
        let ticks = 2 * config.objects + config.rounds * config.operations_per_round;
        assert!(sim.clock() > 0);
        assert!(sim.clock() as usize <= ticks);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            nodes: 0,
            ..SimConfig::default()
        };
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_random_uuid_is_v4() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_uuid(&mut rng).get_version_num(), 4);
    }
}
