use std::mem;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, warn};

use lse_types::Hash256;

use crate::backend::Backend;
use crate::cache::{NegativeCache, ObjectCache};
use crate::error::StoreResult;
use crate::object::{HashedObject, HashedObjectKind};

/// Records migrated per backend transaction during `import`.
const IMPORT_BATCH_SIZE: usize = 128;

/// Content-addressed object store with write coalescing.
///
/// Sits in front of a pluggable durable [`Backend`]. `store` deduplicates
/// by hash, caches the object, and enqueues it for a background writer
/// that flushes whole batches in single backend transactions. `retrieve`
/// serves from the cache, consults a timed negative cache before touching
/// the backend, and escalates backend faults instead of conflating them
/// with misses. [`HashedObjectStore::wait_write`] is the durability
/// barrier callers take before acknowledging client-visible state.
///
/// At most one background writer runs per store; this serializes writes to
/// the backend while batching concurrent `store` calls into few
/// transactions.
pub struct HashedObjectStore {
    backend: Arc<dyn Backend>,
    cache: ObjectCache,
    negative: NegativeCache,
    writer: Mutex<WriterState>,
    write_done: Condvar,
}

struct WriterState {
    /// Objects accepted by `store` but not yet claimed by the writer.
    pending: Vec<Arc<HashedObject>>,
    /// Non-empty batches claimed by the writer so far.
    claimed: u64,
    /// Claimed batches made durable so far. Trails `claimed` by at most
    /// one, while a flush is in flight. Waiters block on this counter, so
    /// a wakeup between a claim and its flush cannot release the barrier
    /// early.
    flushed: u64,
    /// True while a writer thread is alive for this store.
    writing: bool,
}

impl HashedObjectStore {
    /// Default negative-cache age: two minutes of confirmed absence.
    const NEGATIVE_CACHE_AGE: Duration = Duration::from_secs(120);

    /// Create a store over `backend` with the given positive-cache targets.
    pub fn new(
        backend: Arc<dyn Backend>,
        cache_size: usize,
        cache_age: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            cache: ObjectCache::new(cache_size, cache_age),
            negative: NegativeCache::new(Self::NEGATIVE_CACHE_AGE),
            writer: Mutex::new(WriterState {
                pending: Vec::new(),
                claimed: 0,
                flushed: 0,
                writing: false,
            }),
            write_done: Condvar::new(),
        })
    }

    /// Accept an object for durable storage.
    ///
    /// Verifies that `hash` is the content digest of `data` (a defensive
    /// check against caller bugs), deduplicates against the cache, and on
    /// a genuinely new object enqueues a pending write, arming the
    /// background writer if none is active. Any stale negative-cache entry
    /// for the hash is invalidated.
    ///
    /// Returns `Ok(true)` if newly stored, `Ok(false)` if already known.
    pub fn store(
        self: &Arc<Self>,
        kind: HashedObjectKind,
        ledger_index: u32,
        data: Vec<u8>,
        hash: Hash256,
    ) -> StoreResult<bool> {
        let object = HashedObject::new(kind, ledger_index, data, hash)?;
        let (canonical, already_resident) = self.cache.canonicalize(object);
        self.negative.remove(&hash);
        if already_resident {
            debug!(hash = %hash.short_hex(), "store: object already known");
            return Ok(false);
        }

        let mut state = self.writer.lock().expect("writer lock poisoned");
        state.pending.push(canonical);
        if !state.writing {
            state.writing = true;
            let store = Arc::clone(self);
            thread::Builder::new()
                .name("lse-store-writer".into())
                .spawn(move || store.write_loop())
                .expect("failed to spawn store writer thread");
        }
        Ok(true)
    }

    /// Look up an object by content hash.
    ///
    /// Cache hit and negative-cache hit answer without touching the
    /// backend. A backend miss is recorded in the negative cache; a
    /// backend fault is escalated, never cached as a negative result.
    pub fn retrieve(&self, hash: &Hash256) -> StoreResult<Option<Arc<HashedObject>>> {
        if let Some(object) = self.cache.fetch(hash) {
            return Ok(Some(object));
        }
        if self.negative.contains(hash) {
            debug!(hash = %hash.short_hex(), "retrieve: negative cache hit");
            return Ok(None);
        }

        match self.backend.get(hash)? {
            None => {
                self.negative.insert(*hash);
                Ok(None)
            }
            Some(object) => {
                let (canonical, _) = self.cache.canonicalize(object);
                Ok(Some(canonical))
            }
        }
    }

    /// Durability barrier: block until every write pending at call time
    /// has been flushed to the backend.
    pub fn wait_write(&self) {
        let mut state = self.writer.lock().expect("writer lock poisoned");
        if !state.writing {
            return;
        }
        // Everything pending now lands in batch `claimed + 1`; with nothing
        // pending, only an already-claimed in-flight batch remains.
        let target = if state.pending.is_empty() {
            state.claimed
        } else {
            state.claimed + 1
        };
        while state.writing && state.flushed < target {
            state = self
                .write_done
                .wait(state)
                .expect("writer lock poisoned");
        }
    }

    /// Adjust the positive cache's size/age targets and the negative
    /// cache's age bound.
    pub fn tune(&self, cache_size: usize, cache_age: Duration, negative_age: Duration) {
        self.cache.tune(cache_size, cache_age);
        self.negative.tune(negative_age);
    }

    /// Enforce both caches' targets, evicting accordingly.
    pub fn sweep(&self) {
        let positive = self.cache.sweep();
        let negative = self.negative.sweep();
        if positive > 0 || negative > 0 {
            debug!(positive, negative, "cache sweep evicted entries");
        }
    }

    /// Bulk-load every record of `source` into this store's backend.
    ///
    /// An offline migration utility, not part of the steady-state path.
    /// Records failing their digest check are skipped with a warning.
    /// Returns the number of records migrated.
    pub fn import(&self, source: &dyn Backend) -> StoreResult<usize> {
        let mut objects: Vec<Arc<HashedObject>> = Vec::new();
        let mut skipped = 0usize;
        source.for_each(&mut |object| {
            if object.verify() {
                objects.push(Arc::new(object));
            } else {
                skipped += 1;
            }
        })?;
        if skipped > 0 {
            warn!(skipped, "import: skipped records failing digest check");
        }

        let mut migrated = 0usize;
        for chunk in objects.chunks(IMPORT_BATCH_SIZE) {
            self.backend.put_batch(chunk)?;
            migrated += chunk.len();
        }
        debug!(migrated, "import complete");
        Ok(migrated)
    }

    /// Number of objects resident in the positive cache.
    pub fn cached_objects(&self) -> usize {
        self.cache.len()
    }

    /// Background writer: drain, flush, re-check until the pending list is
    /// observed empty, then disarm.
    ///
    /// `flushed` only advances after a claimed batch is durable, which is
    /// what makes `wait_write` a durability barrier rather than a
    /// scheduling barrier.
    fn write_loop(&self) {
        loop {
            let batch = {
                let mut state = self.writer.lock().expect("writer lock poisoned");
                let batch = mem::take(&mut state.pending);
                if batch.is_empty() {
                    state.writing = false;
                    self.write_done.notify_all();
                    return;
                }
                state.claimed += 1;
                batch
            };

            debug!(objects = batch.len(), "flushing pending write batch");
            if let Err(e) = self.backend.put_batch(&batch) {
                // A failed durable batch means previously-acknowledged data
                // could be unrecoverable. The node cannot continue safely.
                error!(error = %e, objects = batch.len(), "durable batch write failed");
                std::process::abort();
            }

            let mut state = self.writer.lock().expect("writer lock poisoned");
            state.flushed += 1;
            self.write_done.notify_all();
        }
    }
}

impl std::fmt::Debug for HashedObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashedObjectStore")
            .field("cached_objects", &self.cache.len())
            .field("negative_entries", &self.negative.len())
            .finish()
    }
}
