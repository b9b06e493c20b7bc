//! Randomised payloads managed by simulated replicas

use crate::words;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Flat record with text fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleA {
    pub version: u64,
    pub owner: String,
    pub label: String,
    pub flag: bool,
}

impl SimpleA {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            version: 0,
            owner: words::full_name(rng),
            label: words::word(rng, 2, 4),
            flag: rng.gen(),
        }
    }

    fn mutate<R: Rng + ?Sized>(&mut self, prob: f64, rng: &mut R) -> bool {
        let mut changed = false;
        if rng.gen_bool(prob) {
            self.owner = words::full_name(rng);
            changed = true;
        }
        if rng.gen_bool(prob) {
            self.label = words::word(rng, 2, 4);
            changed = true;
        }
        if rng.gen_bool(prob) {
            self.flag = !self.flag;
            changed = true;
        }
        if changed {
            self.version += 1;
        }
        changed
    }
}

/// Single integer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleB {
    pub version: u64,
    pub int_value: i32,
}

impl SimpleB {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            version: 0,
            int_value: rng.gen(),
        }
    }

    fn mutate<R: Rng + ?Sized>(&mut self, prob: f64, rng: &mut R) -> bool {
        if !rng.gen_bool(prob) {
            return false;
        }
        self.int_value = rng.gen();
        self.version += 1;
        true
    }
}

/// Nested record holding both simple kinds and a tag list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub version: u64,
    pub title: String,
    pub a: SimpleA,
    pub b: SimpleB,
    pub tags: Vec<String>,
}

impl Composite {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let tag_count = rng.gen_range(0..4);
        Self {
            version: 0,
            title: words::sentence(rng, 3),
            a: SimpleA::random(rng),
            b: SimpleB::random(rng),
            tags: (0..tag_count).map(|_| words::word(rng, 1, 2)).collect(),
        }
    }

    fn mutate<R: Rng + ?Sized>(&mut self, prob: f64, rng: &mut R) -> bool {
        let mut changed = self.a.mutate(prob, rng);
        changed |= self.b.mutate(prob, rng);

        if rng.gen_bool(prob) {
            self.title = words::sentence(rng, 3);
            changed = true;
        }
        if rng.gen_bool(prob) {
            self.tags.push(words::word(rng, 1, 2));
            changed = true;
        }
        if changed {
            self.version += 1;
        }
        changed
    }
}

/// Kind of payload a simulated object carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    SimpleA,
    SimpleB,
    Composite,
}

impl PayloadKind {
    pub const ALL: [PayloadKind; 3] = [PayloadKind::SimpleA, PayloadKind::SimpleB, PayloadKind::Composite];
}

/// Document stored in every simulated CRDT, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    SimpleA(SimpleA),
    SimpleB(SimpleB),
    Composite(Composite),
}

impl Payload {
    pub fn random<R: Rng + ?Sized>(kind: PayloadKind, rng: &mut R) -> Self {
        match kind {
            PayloadKind::SimpleA => Payload::SimpleA(SimpleA::random(rng)),
            PayloadKind::SimpleB => Payload::SimpleB(SimpleB::random(rng)),
            PayloadKind::Composite => Payload::Composite(Composite::random(rng)),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::SimpleA(_) => PayloadKind::SimpleA,
            Payload::SimpleB(_) => PayloadKind::SimpleB,
            Payload::Composite(_) => PayloadKind::Composite,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            Payload::SimpleA(a) => a.version,
            Payload::SimpleB(b) => b.version,
            Payload::Composite(c) => c.version,
        }
    }

    /// Change each field with probability `prob`; returns whether anything
    /// changed. `prob` must lie in `0.0..=1.0`.
    pub fn mutate<R: Rng + ?Sized>(&mut self, prob: f64, rng: &mut R) -> bool {
        match self {
            Payload::SimpleA(a) => a.mutate(prob, rng),
            Payload::SimpleB(b) => b.mutate(prob, rng),
            Payload::Composite(c) => c.mutate(prob, rng),
        }
    }
}
