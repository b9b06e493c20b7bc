//! JCRDT Simulation Harness
//!
//! Drives the core engine the way a set of independent replicas would:
//! - Nodes holding one manager per object, with random selection
//! - Randomised payloads and pseudo-word generators
//! - Seeded multi-round runs that check replicas converge
//!
//! All randomness flows from a single seeded generator, so a run is fully
//! reproducible from its configuration.

pub mod config;
pub mod data;
pub mod error;
pub mod manager;
pub mod node;
pub mod simulation;
pub mod words;

pub use config::SimConfig;
pub use data::{Composite, Payload, PayloadKind, SimpleA, SimpleB};
pub use error::{SimError, SimResult};
pub use manager::SimManager;
pub use node::Node;
pub use simulation::{random_uuid, SimReport, Simulation};
