//! Basic JCRDT Example
//!
//! This example demonstrates two replicas editing one JSON document,
//! exchanging their logs, and converging.
//!
//! Run with: cargo run --example basic

use serde_json::json;
use uuid::Uuid;

use jcrdt_codec::{Codec, Format, OperationBatch};
use jcrdt_core::{CrdtManager, DocumentManager, JsonManager, OperationManager};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("JCRDT Basic Example\n");

    println!("=== Embedded Mode ===\n");
    embedded_example()?;

    println!("\n=== Exchanging Batches ===\n");
    exchange_example()?;

    Ok(())
}

fn embedded_example() -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = JsonManager::new();

    doc.create(1);
    println!("Created document");

    doc.apply_update(&json!({ "count": 0 }), 2)?;
    println!("Set count: {:?}", doc.document()?);

    doc.apply_update(&json!({ "count": 1 }), 3)?;
    println!("Incremented: {:?}", doc.document()?);

    // A pending operation still counts until someone rejects it
    let guess = CrdtManager::generate_update(&json!({ "count": 1 }), &json!({ "count": 99 }), 4)?;
    doc.push(OperationManager::pending(guess.clone()));
    println!("With pending update: {:?}", doc.document()?);

    doc.push(OperationManager::rejected(guess));
    println!("After rejection: {:?}", doc.document()?);

    doc.delete(5);
    println!("Deleted: {:?} (log still holds {} operations)",
        doc.document()?, doc.manager().crdt().log_len());

    Ok(())
}

fn exchange_example() -> Result<(), Box<dyn std::error::Error>> {
    let object_id = Uuid::new_v4();
    let codec = Codec::new(Format::MessagePack);

    let mut alice = JsonManager::new();
    let mut bob = JsonManager::new();

    let mut outgoing = OperationBatch::new(Uuid::new_v4(), object_id);
    outgoing.push(OperationManager::approved(alice.create(1)));
    outgoing.push(OperationManager::approved(
        alice.apply_update(&json!({ "title": "draft", "tags": ["a"] }), 2)?,
    ));

    let bytes = codec.encode_batch(&outgoing)?;
    println!("Alice sent {} operations in {} bytes", outgoing.len(), bytes.len());

    let received = codec.decode_batch(&bytes)?;
    let applied = received.apply_to(bob.manager_mut());
    println!("Bob applied {applied} operations: {:?}", bob.document()?);

    bob.apply_update(&json!({ "title": "final", "tags": ["a"] }), 3)?;

    // Full state merge in the other direction
    alice.manager_mut().merge(bob.manager());
    println!("Alice after merge: {:?}", alice.document()?);
    println!("Converged: {}", alice == bob);

    Ok(())
}
