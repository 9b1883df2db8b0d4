use std::sync::Arc;

use lse_types::Hash256;

use crate::error::BackendError;
use crate::object::HashedObject;

/// Durable key-value engine underneath the object store.
///
/// Contract:
/// - `get` returns `Ok(None)` only for a true miss; any fault (I/O error,
///   undecodable record) is an `Err` so the store can escalate it instead
///   of caching a bogus negative result.
/// - `put_batch` persists the whole batch atomically as a unit: after a
///   crash either every record of the batch is durable or none is.
/// - Implementations are internally synchronized; the store calls them
///   from its background writer thread and from reader threads at once.
pub trait Backend: Send + Sync {
    /// Read one record by content hash.
    fn get(&self, hash: &Hash256) -> Result<Option<HashedObject>, BackendError>;

    /// Persist one record. Idempotent: rewriting an existing hash is a no-op.
    fn put(&self, object: &HashedObject) -> Result<(), BackendError>;

    /// Persist a batch atomically as a unit.
    fn put_batch(&self, batch: &[Arc<HashedObject>]) -> Result<(), BackendError>;

    /// Visit every stored record. Offline migration (`import`) only; not
    /// part of the steady-state read/write path.
    fn for_each(&self, visit: &mut dyn FnMut(HashedObject)) -> Result<(), BackendError>;
}
