//! Object-identified managers held by simulated replicas

use crate::data::Payload;
use jcrdt_core::{CrdtManager, DocumentManager, Operation, Result, Timestamp, TypedManager};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A payload manager bound to the object it tracks
///
/// Two managers are equal only when they track the same object and hold the
/// same effective log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TaggedSimManager", into = "TaggedSimManager")]
pub struct SimManager {
    object_id: Uuid,
    manager: TypedManager<Payload>,
}

/// Encoded form; decoding any other `type` tag fails.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum TaggedSimManager {
    SimCrdtManager {
        object_id: Uuid,
        manager: TypedManager<Payload>,
    },
}

impl From<TaggedSimManager> for SimManager {
    fn from(tagged: TaggedSimManager) -> Self {
        let TaggedSimManager::SimCrdtManager { object_id, manager } = tagged;
        Self { object_id, manager }
    }
}

impl From<SimManager> for TaggedSimManager {
    fn from(sim: SimManager) -> Self {
        TaggedSimManager::SimCrdtManager {
            object_id: sim.object_id,
            manager: sim.manager,
        }
    }
}

impl SimManager {
    pub fn new(object_id: Uuid) -> Self {
        Self {
            object_id,
            manager: TypedManager::new(),
        }
    }

    pub fn object_id(&self) -> Uuid {
        self.object_id
    }

    pub fn clear(&mut self) {
        self.manager.manager_mut().clear();
    }

    pub fn merge(&mut self, other: &SimManager) {
        self.manager.manager_mut().merge(other.manager());
    }
}

impl DocumentManager<Payload> for SimManager {
    fn manager(&self) -> &CrdtManager {
        self.manager.manager()
    }

    fn manager_mut(&mut self) -> &mut CrdtManager {
        self.manager.manager_mut()
    }

    fn base(&self) -> Value {
        self.manager.base()
    }

    fn document(&self) -> Result<Option<Payload>> {
        self.manager.document()
    }

    fn apply_update(&mut self, target: &Payload, timestamp: Timestamp) -> Result<Operation> {
        self.manager.apply_update(target, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PayloadKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_equality_includes_object_id() {
        let a = SimManager::new(Uuid::from_u128(1));
        let b = SimManager::new(Uuid::from_u128(2));
        assert_ne!(a, b);
        assert_eq!(a, SimManager::new(Uuid::from_u128(1)));
    }

    #[test]
    fn test_payload_lifecycle() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut manager = SimManager::new(Uuid::from_u128(3));
        let payload = Payload::random(PayloadKind::Composite, &mut rng);

        manager.create(1);
        manager.apply_update(&payload, 2).unwrap();
        assert_eq!(manager.document().unwrap(), Some(payload));

        manager.delete(3);
        assert_eq!(manager.document().unwrap(), None);
    }

    #[test]
    fn test_encoded_with_type_tag() {
        let manager = SimManager::new(Uuid::nil());
        let value = serde_json::to_value(&manager).unwrap();
        assert_eq!(value["type"], "SimCrdtManager");

        let decoded: SimManager = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, manager);
    }

    #[test]
    fn test_foreign_type_tag_is_rejected() {
        let mut value = serde_json::to_value(SimManager::new(Uuid::nil())).unwrap();
        value["type"] = "JsonManager".into();
        assert!(serde_json::from_value::<SimManager>(value.clone()).is_err());

        value.as_object_mut().unwrap().remove("type");
        assert!(serde_json::from_value::<SimManager>(value).is_err());
    }

    #[test]
    fn test_hash_includes_object_id() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        fn hash_of(manager: &SimManager) -> u64 {
            let mut hasher = DefaultHasher::new();
            manager.hash(&mut hasher);
            hasher.finish()
        }

        let mut a = SimManager::new(Uuid::from_u128(1));
        let mut b = SimManager::new(Uuid::from_u128(1));
        a.create(4);
        b.create(4);
        assert_eq!(hash_of(&a), hash_of(&b));

        let mut other = SimManager::new(Uuid::from_u128(2));
        other.create(4);
        assert_ne!(hash_of(&a), hash_of(&other));
    }
}
