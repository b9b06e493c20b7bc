//! Operation batches exchanged between replicas

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};
use jcrdt_core::{CrdtManager, OperationManager};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelopes for one object, produced by one replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBatch {
    pub origin: Uuid,
    pub object_id: Uuid,
    pub entries: Vec<OperationManager>,
}

impl OperationBatch {
    pub fn new(origin: Uuid, object_id: Uuid) -> Self {
        Self {
            origin,
            object_id,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, envelope: OperationManager) {
        self.entries.push(envelope);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push every entry into `manager`; returns how many changed the log.
    pub fn apply_to(&self, manager: &mut CrdtManager) -> usize {
        self.entries
            .iter()
            .filter(|envelope| manager.push((*envelope).clone()))
            .count()
    }
}

impl Codec {
    pub fn encode_batch(&self, batch: &OperationBatch) -> CodecResult<Vec<u8>> {
        self.encode(batch)
    }

    /// Decode a batch, refusing one without entries.
    pub fn decode_batch(&self, bytes: &[u8]) -> CodecResult<OperationBatch> {
        let batch: OperationBatch = self.decode(bytes)?;
        if batch.is_empty() {
            return Err(CodecError::EmptyBatch {
                object_id: batch.object_id,
            });
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Format;

    #[test]
    fn test_apply_counts_changes() {
        let mut batch = OperationBatch::new(Uuid::nil(), Uuid::nil());
        batch.push(OperationManager::approved(CrdtManager::generate_create(1)));
        batch.push(OperationManager::approved(CrdtManager::generate_create(1)));
        batch.push(OperationManager::rejected(CrdtManager::generate_read(2)));

        let mut manager = CrdtManager::new();
        assert_eq!(batch.apply_to(&mut manager), 2);
        assert!(manager.is_created());
        assert!(!manager.is_read());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let codec = Codec::new(Format::Json);
        let bytes = codec.encode_batch(&OperationBatch::new(Uuid::nil(), Uuid::nil())).unwrap();
        assert!(matches!(
            codec.decode_batch(&bytes),
            Err(CodecError::EmptyBatch { .. })
        ));
    }
}
