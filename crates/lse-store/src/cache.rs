use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lse_types::Hash256;

use crate::object::HashedObject;

/// Shared positive cache of hashed objects.
///
/// Internally synchronized; callers on any thread use `&self`. Eviction is
/// driven by [`ObjectCache::sweep`]: entries older than the target age go
/// first, then the oldest entries until the target size is met.
pub struct ObjectCache {
    inner: Mutex<ObjectCacheInner>,
}

struct ObjectCacheInner {
    entries: HashMap<Hash256, CacheSlot>,
    target_size: usize,
    target_age: Duration,
}

struct CacheSlot {
    object: Arc<HashedObject>,
    last_access: Instant,
}

impl ObjectCache {
    /// Create a cache with the given size/age targets.
    pub fn new(target_size: usize, target_age: Duration) -> Self {
        Self {
            inner: Mutex::new(ObjectCacheInner {
                entries: HashMap::new(),
                target_size,
                target_age,
            }),
        }
    }

    /// Look up an object, refreshing its access time on a hit.
    pub fn fetch(&self, hash: &Hash256) -> Option<Arc<HashedObject>> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let slot = inner.entries.get_mut(hash)?;
        slot.last_access = Instant::now();
        Some(Arc::clone(&slot.object))
    }

    /// Insert an object, deduplicating by hash.
    ///
    /// Returns the canonical shared instance plus `true` if the object was
    /// already resident (the caller's copy is discarded in that case).
    pub fn canonicalize(&self, object: HashedObject) -> (Arc<HashedObject>, bool) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let now = Instant::now();
        if let Some(slot) = inner.entries.get_mut(object.hash()) {
            slot.last_access = now;
            return (Arc::clone(&slot.object), true);
        }
        let arc = Arc::new(object);
        inner.entries.insert(
            *arc.hash(),
            CacheSlot {
                object: Arc::clone(&arc),
                last_access: now,
            },
        );
        (arc, false)
    }

    /// Adjust the size/age targets. Takes effect on the next sweep.
    pub fn tune(&self, target_size: usize, target_age: Duration) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.target_size = target_size;
        inner.target_age = target_age;
    }

    /// Enforce the targets. Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let now = Instant::now();
        let before = inner.entries.len();
        let target_age = inner.target_age;
        inner
            .entries
            .retain(|_, slot| now.duration_since(slot.last_access) <= target_age);

        if inner.entries.len() > inner.target_size {
            let excess = inner.entries.len() - inner.target_size;
            let mut by_age: Vec<(Hash256, Instant)> = inner
                .entries
                .iter()
                .map(|(hash, slot)| (*hash, slot.last_access))
                .collect();
            by_age.sort_by_key(|(_, at)| *at);
            for (hash, _) in by_age.into_iter().take(excess) {
                inner.entries.remove(&hash);
            }
        }
        before - inner.entries.len()
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    /// Returns `true` if no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache of recently-confirmed-absent lookups, bounded by age.
///
/// A hit means "the backend reported a miss for this hash recently", which
/// lets `retrieve` answer absent without another backend round-trip.
pub struct NegativeCache {
    inner: Mutex<NegativeCacheInner>,
}

struct NegativeCacheInner {
    entries: HashMap<Hash256, Instant>,
    max_age: Duration,
}

impl NegativeCache {
    /// Create a negative cache whose entries expire after `max_age`.
    pub fn new(max_age: Duration) -> Self {
        Self {
            inner: Mutex::new(NegativeCacheInner {
                entries: HashMap::new(),
                max_age,
            }),
        }
    }

    /// Record a confirmed miss.
    pub fn insert(&self, hash: Hash256) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.entries.insert(hash, Instant::now());
    }

    /// Drop a stale miss record (the hash has just been stored).
    pub fn remove(&self, hash: &Hash256) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.entries.remove(hash);
    }

    /// Returns `true` if the hash was confirmed absent within the age bound.
    pub fn contains(&self, hash: &Hash256) -> bool {
        let inner = self.inner.lock().expect("cache lock poisoned");
        match inner.entries.get(hash) {
            Some(at) => at.elapsed() <= inner.max_age,
            None => false,
        }
    }

    /// Adjust the age bound.
    pub fn tune(&self, max_age: Duration) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.max_age = max_age;
    }

    /// Drop expired entries. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let before = inner.entries.len();
        let max_age = inner.max_age;
        inner.entries.retain(|_, at| at.elapsed() <= max_age);
        before - inner.entries.len()
    }

    /// Number of recorded misses.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    /// Returns `true` if no misses are recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::HashedObjectKind;

    fn make_object(data: &[u8]) -> HashedObject {
        HashedObject::from_content(HashedObjectKind::Ledger, 1, data.to_vec())
    }

    #[test]
    fn canonicalize_deduplicates() {
        let cache = ObjectCache::new(16, Duration::from_secs(60));
        let obj = make_object(b"dup");

        let (first, present) = cache.canonicalize(obj.clone());
        assert!(!present);
        let (second, present) = cache.canonicalize(obj);
        assert!(present);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fetch_hits_and_misses() {
        let cache = ObjectCache::new(16, Duration::from_secs(60));
        let obj = make_object(b"fetch");
        let hash = *obj.hash();
        assert!(cache.fetch(&hash).is_none());

        cache.canonicalize(obj);
        assert!(cache.fetch(&hash).is_some());
    }

    #[test]
    fn sweep_enforces_size_target() {
        let cache = ObjectCache::new(2, Duration::from_secs(60));
        for i in 0..5u8 {
            cache.canonicalize(make_object(&[i]));
        }
        assert_eq!(cache.len(), 5);
        let evicted = cache.sweep();
        assert_eq!(evicted, 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn sweep_enforces_age_target() {
        let cache = ObjectCache::new(16, Duration::ZERO);
        cache.canonicalize(make_object(b"old"));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn tune_changes_targets() {
        let cache = ObjectCache::new(16, Duration::from_secs(60));
        for i in 0..4u8 {
            cache.canonicalize(make_object(&[i]));
        }
        cache.tune(1, Duration::from_secs(60));
        cache.sweep();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn negative_cache_records_and_forgets() {
        let cache = NegativeCache::new(Duration::from_secs(60));
        let hash = Hash256::from_bytes([9; 32]);
        assert!(!cache.contains(&hash));

        cache.insert(hash);
        assert!(cache.contains(&hash));

        cache.remove(&hash);
        assert!(!cache.contains(&hash));
    }

    #[test]
    fn negative_cache_expires() {
        let cache = NegativeCache::new(Duration::ZERO);
        let hash = Hash256::from_bytes([7; 32]);
        cache.insert(hash);
        std::thread::sleep(Duration::from_millis(5));
        assert!(!cache.contains(&hash));
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }
}
