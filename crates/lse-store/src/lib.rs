//! Content-addressed object storage for the ledger state engine.
//!
//! Whenever a full ledger or raw transaction blob must be durably
//! retained, it is wrapped as a [`HashedObject`] — an immutable blob whose
//! 256-bit hash is the SHA-512-half of its content — and handed to the
//! [`HashedObjectStore`].
//!
//! # Store behavior
//!
//! - **Deduplication**: a hash already resident in the cache is never
//!   written twice; `store` reports "already known".
//! - **Write coalescing**: accepted objects go onto a pending list flushed
//!   by a single background writer, one backend transaction per batch.
//! - **Durability barrier**: [`HashedObjectStore::wait_write`] blocks
//!   until everything pending at call time is durable — the hook for
//!   callers that must not acknowledge a request before its data is safe.
//! - **Negative caching**: confirmed backend misses are remembered for a
//!   bounded time so repeated lookups of absent hashes stay cheap.
//! - **Fault escalation**: a failed batch write aborts the process
//!   (silently dropping acknowledged writes is worse than crashing), and
//!   backend read faults are returned as errors, never cached as misses.
//!
//! # Backends
//!
//! Durability is delegated to a pluggable [`Backend`]:
//!
//! - [`MemoryBackend`] — `HashMap`-based engine for tests and embedding

pub mod backend;
pub mod cache;
pub mod error;
pub mod memory;
pub mod object;
pub mod store;

// Re-export primary types at crate root for ergonomic imports.
pub use backend::Backend;
pub use cache::{NegativeCache, ObjectCache};
pub use error::{BackendError, StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use object::{HashedObject, HashedObjectKind, StoredRecord};
pub use store::HashedObjectStore;
