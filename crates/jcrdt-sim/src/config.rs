//! Simulation configuration
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! seed = 42
//! nodes = 5
//! reject_probability = 0.25
//! wire_format = "message-pack"
//! ```

use crate::error::{SimError, SimResult};
use jcrdt_codec::Format;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Seed for the single random source driving the run
    pub seed: u64,
    /// Number of replicas
    pub nodes: usize,
    /// Number of documents created up front
    pub objects: usize,
    /// Rounds of local activity followed by admission and exchange
    pub rounds: usize,
    pub operations_per_round: usize,
    /// Relative weights for the kind of each generated operation
    pub read_weight: u32,
    pub update_weight: u32,
    pub delete_weight: u32,
    /// Per-field chance that an update changes that field
    pub update_probability: f64,
    /// Chance that a new operation waits for admission instead of being
    /// approved immediately
    pub pending_probability: f64,
    /// Chance that a pending operation is finally rejected
    pub reject_probability: f64,
    /// Chance that a delivered envelope is delivered a second time
    pub duplicate_probability: f64,
    /// Chance that the logical clock advances between operations; lower
    /// values produce more timestamp ties
    pub clock_advance_probability: f64,
    /// Encode every batch in this format before delivery
    pub wire_format: Option<Format>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            nodes: 3,
            objects: 10,
            rounds: 5,
            operations_per_round: 50,
            read_weight: 2,
            update_weight: 6,
            delete_weight: 1,
            update_probability: 0.5,
            pending_probability: 0.3,
            reject_probability: 0.2,
            duplicate_probability: 0.1,
            clock_advance_probability: 0.8,
            wire_format: None,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> SimResult<Self> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.nodes == 0 {
            return Err(SimError::InvalidConfig("at least one node is required".into()));
        }
        if self.read_weight + self.update_weight + self.delete_weight == 0 {
            return Err(SimError::InvalidConfig("operation weights must not all be zero".into()));
        }

        let probabilities = [
            ("update_probability", self.update_probability),
            ("pending_probability", self.pending_probability),
            ("reject_probability", self.reject_probability),
            ("duplicate_probability", self.duplicate_probability),
            ("clock_advance_probability", self.clock_advance_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::InvalidConfig(format!("{name} must be within 0..=1, got {p}")));
            }
        }

        Ok(())
    }
}
