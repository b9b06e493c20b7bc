//! Integration tests verifying merge laws and replica convergence.

use jcrdt_core::{CrdtManager, LastWriteWins, Operation, OperationManager};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

#[derive(Clone, Debug)]
enum Step {
    Create(u64),
    Read(u64),
    Set { ts: u64, field: u8, value: i64 },
    Delete(u64),
}

impl Step {
    fn operation(&self) -> Operation {
        match *self {
            Step::Create(ts) => CrdtManager::generate_create(ts),
            Step::Read(ts) => CrdtManager::generate_read(ts),
            Step::Set { ts, field, value } => {
                let mut target = Map::new();
                target.insert(format!("f{field}"), json!(value));
                CrdtManager::generate_update(&json!({}), &Value::Object(target), ts).unwrap()
            }
            Step::Delete(ts) => CrdtManager::generate_delete(ts),
        }
    }
}

fn arbitrary_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..20u64).prop_map(Step::Create),
        (0..20u64).prop_map(Step::Read),
        (0..20u64, 0..4u8, -50..50i64).prop_map(|(ts, field, value)| Step::Set { ts, field, value }),
        (0..20u64).prop_map(Step::Delete),
    ]
}

/// A step plus whether it is later retracted
fn arbitrary_entry() -> impl Strategy<Value = (Step, bool)> {
    (arbitrary_step(), prop::bool::weighted(0.2))
}

fn replica(entries: &[(Step, bool)]) -> LastWriteWins {
    let mut crdt = LastWriteWins::new();
    for (step, retracted) in entries {
        let op = step.operation();
        if *retracted {
            crdt.rem_operation(op.clone());
        }
        crdt.add_operation(op);
    }
    crdt
}

type State = (Value, Option<Value>, bool, bool, bool, bool, bool);

fn state(crdt: &LastWriteWins) -> State {
    (
        crdt.document().unwrap(),
        crdt.live_document(&json!({})).unwrap(),
        crdt.is_created(),
        crdt.is_read(),
        crdt.is_updated(),
        crdt.is_deleted(),
        crdt.is_logically_deleted(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn adding_twice_is_idempotent(entries in prop::collection::vec(arbitrary_entry(), 0..30)) {
        let once = replica(&entries);
        let mut twice = once.clone();
        for (step, _) in &entries {
            twice.add_operation(step.operation());
        }

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(state(&once), state(&twice));
    }

    #[test]
    fn admission_order_does_not_matter(entries in prop::collection::vec(arbitrary_entry(), 0..30)) {
        let forward = replica(&entries);
        let reversed: Vec<_> = entries.iter().rev().cloned().collect();
        let backward = replica(&reversed);

        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(state(&forward), state(&backward));
    }

    #[test]
    fn three_replicas_converge(
        entries in prop::collection::vec(arbitrary_entry(), 0..40),
        split in prop::collection::vec(0..3usize, 40),
    ) {
        let mut parts: [Vec<(Step, bool)>; 3] = Default::default();
        for (i, entry) in entries.iter().enumerate() {
            parts[split[i]].push(entry.clone());
        }
        let [a, b, c] = parts.map(|p| replica(&p));

        let mut abc = a.clone();
        abc.merge(&b);
        abc.merge(&c);

        let mut bc = b.clone();
        bc.merge(&c);
        let mut a_bc = a.clone();
        a_bc.merge(&bc);

        let mut cba = c.clone();
        cba.merge(&b);
        cba.merge(&a);

        prop_assert_eq!(&abc, &a_bc);
        prop_assert_eq!(&abc, &cba);
        prop_assert_eq!(state(&abc), state(&a_bc));
        prop_assert_eq!(state(&abc), state(&cba));
        prop_assert_eq!(&abc, &replica(&entries));
    }

    #[test]
    fn merge_with_self_is_identity(entries in prop::collection::vec(arbitrary_entry(), 0..30)) {
        let crdt = replica(&entries);
        let mut merged = crdt.clone();
        merged.merge(&crdt);

        prop_assert_eq!(merged.added(), crdt.added());
        prop_assert_eq!(merged.removed(), crdt.removed());
    }

    #[test]
    fn tombstone_excludes_in_any_order(step in arbitrary_step(), remove_first in any::<bool>()) {
        let op = step.operation();
        let mut crdt = LastWriteWins::new();
        if remove_first {
            crdt.rem_operation(op.clone());
            crdt.add_operation(op.clone());
        } else {
            crdt.add_operation(op.clone());
            crdt.rem_operation(op.clone());
        }

        prop_assert!(crdt.effective_operations().all(|o| o != &op));
        prop_assert!(crdt.is_empty());
    }
}

#[test]
fn rejected_envelope_keeps_operation_out() {
    let mut manager = CrdtManager::new();
    let op = CrdtManager::generate_create(1);
    manager.push(OperationManager::rejected(op.clone()));

    assert!(!manager.crdt().effective_operations().any(|o| o == &op));
    assert!(!manager.is_created());
}

#[test]
fn same_timestamp_updates_resolve_identically_everywhere() {
    let x = CrdtManager::generate_update(&json!({}), &json!({"a": "x"}), 5).unwrap();
    let y = CrdtManager::generate_update(&json!({}), &json!({"a": "y"}), 5).unwrap();

    let mut left = CrdtManager::new();
    left.push(OperationManager::approved(x.clone()));
    left.push(OperationManager::approved(y.clone()));

    let mut right = CrdtManager::new();
    right.push(OperationManager::approved(y));
    right.push(OperationManager::approved(x));

    assert_eq!(left.document().unwrap(), right.document().unwrap());
}

#[test]
fn racing_delete_resolves_by_timestamp_not_arrival() {
    let create = CrdtManager::generate_create(1);
    let update = CrdtManager::generate_update(&json!({}), &json!({"a": 1}), 5).unwrap();
    let stale_delete = CrdtManager::generate_delete(2);

    let mut update_first = LastWriteWins::new();
    update_first.add_operation(create.clone());
    update_first.add_operation(update.clone());
    update_first.add_operation(stale_delete.clone());

    let mut delete_first = LastWriteWins::new();
    delete_first.add_operation(stale_delete);
    delete_first.add_operation(create);
    delete_first.add_operation(update);

    for crdt in [&update_first, &delete_first] {
        assert!(crdt.is_deleted());
        assert!(!crdt.is_logically_deleted());
        assert_eq!(crdt.live_document(&json!({})).unwrap(), Some(json!({"a": 1})));
    }
    assert_eq!(state(&update_first), state(&delete_first));
}
