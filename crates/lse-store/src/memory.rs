use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lse_types::Hash256;

use crate::backend::Backend;
use crate::error::BackendError;
use crate::object::{HashedObject, StoredRecord};

/// In-memory, HashMap-based backend.
///
/// Intended for tests and embedding. Records are held in their persisted
/// (bincode-encoded) shape behind a `RwLock`, so the decode path is
/// exercised exactly as it would be against a real engine.
pub struct MemoryBackend {
    records: RwLock<HashMap<Hash256, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the backend holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }

    fn encode(object: &HashedObject) -> Result<Vec<u8>, BackendError> {
        bincode::serialize(&StoredRecord::from_object(object)).map_err(|e| {
            BackendError::Corrupt {
                hash: *object.hash(),
                reason: format!("encode failed: {e}"),
            }
        })
    }

    fn decode(hash: &Hash256, bytes: &[u8]) -> Result<HashedObject, BackendError> {
        let record: StoredRecord =
            bincode::deserialize(bytes).map_err(|e| BackendError::Corrupt {
                hash: *hash,
                reason: format!("decode failed: {e}"),
            })?;
        record.into_object()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, hash: &Hash256) -> Result<Option<HashedObject>, BackendError> {
        let records = self.records.read().expect("lock poisoned");
        match records.get(hash) {
            None => Ok(None),
            Some(bytes) => Ok(Some(Self::decode(hash, bytes)?)),
        }
    }

    fn put(&self, object: &HashedObject) -> Result<(), BackendError> {
        let bytes = Self::encode(object)?;
        let mut records = self.records.write().expect("lock poisoned");
        records.entry(*object.hash()).or_insert(bytes);
        Ok(())
    }

    fn put_batch(&self, batch: &[Arc<HashedObject>]) -> Result<(), BackendError> {
        // Encode everything before taking the write lock so the insert
        // section cannot fail half-way: all or nothing.
        let mut encoded = Vec::with_capacity(batch.len());
        for object in batch {
            encoded.push((*object.hash(), Self::encode(object)?));
        }
        let mut records = self.records.write().expect("lock poisoned");
        for (hash, bytes) in encoded {
            records.entry(hash).or_insert(bytes);
        }
        Ok(())
    }

    fn for_each(&self, visit: &mut dyn FnMut(HashedObject)) -> Result<(), BackendError> {
        let records = self.records.read().expect("lock poisoned");
        for (hash, bytes) in records.iter() {
            visit(Self::decode(hash, bytes)?);
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("record_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::HashedObjectKind;

    fn make_object(data: &[u8]) -> HashedObject {
        HashedObject::from_content(HashedObjectKind::Transaction, 3, data.to_vec())
    }

    #[test]
    fn put_and_get() {
        let backend = MemoryBackend::new();
        let obj = make_object(b"hello");
        backend.put(&obj).unwrap();

        let read = backend.get(obj.hash()).unwrap().expect("should exist");
        assert_eq!(read, obj);
    }

    #[test]
    fn get_missing_returns_none() {
        let backend = MemoryBackend::new();
        assert!(backend.get(&Hash256::zero()).unwrap().is_none());
    }

    #[test]
    fn put_is_idempotent() {
        let backend = MemoryBackend::new();
        let obj = make_object(b"once");
        backend.put(&obj).unwrap();
        backend.put(&obj).unwrap();
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn put_batch_stores_all() {
        let backend = MemoryBackend::new();
        let batch: Vec<_> = [b"a".as_slice(), b"b", b"c"]
            .iter()
            .map(|d| Arc::new(make_object(d)))
            .collect();
        backend.put_batch(&batch).unwrap();
        assert_eq!(backend.len(), 3);
        for obj in &batch {
            assert!(backend.get(obj.hash()).unwrap().is_some());
        }
    }

    #[test]
    fn for_each_visits_every_record() {
        let backend = MemoryBackend::new();
        backend.put(&make_object(b"x")).unwrap();
        backend.put(&make_object(b"y")).unwrap();

        let mut seen = 0;
        backend
            .for_each(&mut |obj| {
                assert!(obj.verify());
                seen += 1;
            })
            .unwrap();
        assert_eq!(seen, 2);
    }
}
