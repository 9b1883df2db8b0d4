use std::collections::BTreeMap;

use lse_crypto::sha512_half;
use lse_types::Hash256;

/// Content-hashed map from entry index to serialized blob.
///
/// The ledger owns two of these (transactions and account state) and never
/// assumes anything beyond this interface, so the backing structure is
/// swappable: tests use the in-memory map, a node wires in its synchronized
/// tree.
///
/// Write methods return `false` for precondition failures the caller may
/// treat as expected (adding an existing index, updating a missing one).
/// Backends signal internal faults by panicking; they hold no locks of
/// the caller's.
pub trait StateMap: Send {
    /// Returns `true` if an item exists at `index`.
    fn has_item(&self, index: &Hash256) -> bool;

    /// The blob at `index`, if present.
    fn peek_item(&self, index: &Hash256) -> Option<Vec<u8>>;

    /// Insert a new item. Fails (`false`) if the index is occupied, unless
    /// `duplicate_ok` and the existing blob is byte-identical.
    fn add_item(&mut self, index: Hash256, blob: Vec<u8>, duplicate_ok: bool) -> bool;

    /// Replace an existing item. Fails (`false`) if the index is absent.
    /// Rewriting an identical blob fails unless `duplicate_ok`; that
    /// distinction catches double-applied mutations.
    fn update_item(&mut self, index: Hash256, blob: Vec<u8>, duplicate_ok: bool) -> bool;

    /// Remove an item. Returns `false` if the index was absent.
    fn delete_item(&mut self, index: &Hash256) -> bool;

    /// Digest over the full ordered content. Two maps with equal content
    /// have equal roots; the empty map's root is all-zero.
    fn root_hash(&self) -> Hash256;

    /// Number of items held.
    fn item_count(&self) -> usize;

    /// An independent copy sharing nothing mutable with `self`.
    fn snapshot(&self) -> Box<dyn StateMap>;

    /// Visit every item in index order.
    fn for_each(&self, f: &mut dyn FnMut(&Hash256, &[u8]));
}

/// `BTreeMap`-backed state map.
///
/// The root hash is a flat digest over the ordered items rather than a
/// tree, so it offers no incremental proofs, but it satisfies the
/// content-equality contract and is cheap to reason about in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateMap {
    items: BTreeMap<Hash256, Vec<u8>>,
}

impl MemoryStateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed empty map, the shape the ledger constructors take.
    pub fn boxed() -> Box<dyn StateMap> {
        Box::new(Self::new())
    }
}

impl StateMap for MemoryStateMap {
    fn has_item(&self, index: &Hash256) -> bool {
        self.items.contains_key(index)
    }

    fn peek_item(&self, index: &Hash256) -> Option<Vec<u8>> {
        self.items.get(index).cloned()
    }

    fn add_item(&mut self, index: Hash256, blob: Vec<u8>, duplicate_ok: bool) -> bool {
        match self.items.get(&index) {
            Some(existing) => duplicate_ok && *existing == blob,
            None => {
                self.items.insert(index, blob);
                true
            }
        }
    }

    fn update_item(&mut self, index: Hash256, blob: Vec<u8>, duplicate_ok: bool) -> bool {
        match self.items.get_mut(&index) {
            Some(existing) => {
                if *existing == blob {
                    return duplicate_ok;
                }
                *existing = blob;
                true
            }
            None => false,
        }
    }

    fn delete_item(&mut self, index: &Hash256) -> bool {
        self.items.remove(index).is_some()
    }

    fn root_hash(&self) -> Hash256 {
        if self.items.is_empty() {
            return Hash256::zero();
        }
        // Length-prefixed concatenation keeps item boundaries unambiguous.
        let mut preimage = Vec::with_capacity(self.items.len() * 64);
        for (index, blob) in &self.items {
            preimage.extend_from_slice(index.as_bytes());
            preimage.extend_from_slice(&(blob.len() as u32).to_be_bytes());
            preimage.extend_from_slice(blob);
        }
        sha512_half(&preimage)
    }

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn snapshot(&self) -> Box<dyn StateMap> {
        Box::new(self.clone())
    }

    fn for_each(&self, f: &mut dyn FnMut(&Hash256, &[u8])) {
        for (index, blob) in &self.items {
            f(index, blob);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(seed: u8) -> Hash256 {
        Hash256::from_bytes([seed; 32])
    }

    // ---- add / update / delete ----

    #[test]
    fn add_rejects_occupied_index() {
        let mut map = MemoryStateMap::new();
        assert!(map.add_item(idx(1), vec![1], false));
        assert!(!map.add_item(idx(1), vec![2], false));
        assert_eq!(map.peek_item(&idx(1)), Some(vec![1]));
    }

    #[test]
    fn add_tolerates_identical_duplicate_when_asked() {
        let mut map = MemoryStateMap::new();
        assert!(map.add_item(idx(1), vec![1], true));
        assert!(map.add_item(idx(1), vec![1], true));
        assert!(!map.add_item(idx(1), vec![2], true));
        assert_eq!(map.item_count(), 1);
    }

    #[test]
    fn update_requires_presence() {
        let mut map = MemoryStateMap::new();
        assert!(!map.update_item(idx(1), vec![1], true));
        map.add_item(idx(1), vec![1], false);
        assert!(map.update_item(idx(1), vec![2], false));
        assert_eq!(map.peek_item(&idx(1)), Some(vec![2]));
    }

    #[test]
    fn identical_rewrite_needs_duplicate_ok() {
        let mut map = MemoryStateMap::new();
        map.add_item(idx(1), vec![7], false);
        assert!(!map.update_item(idx(1), vec![7], false));
        assert!(map.update_item(idx(1), vec![7], true));
    }

    #[test]
    fn delete_reports_absence() {
        let mut map = MemoryStateMap::new();
        map.add_item(idx(1), vec![1], false);
        assert!(map.delete_item(&idx(1)));
        assert!(!map.delete_item(&idx(1)));
        assert!(!map.has_item(&idx(1)));
    }

    // ---- root hash ----

    #[test]
    fn empty_root_is_zero() {
        assert_eq!(MemoryStateMap::new().root_hash(), Hash256::zero());
    }

    #[test]
    fn root_depends_on_content_not_insertion_order() {
        let mut a = MemoryStateMap::new();
        a.add_item(idx(1), vec![1], false);
        a.add_item(idx(2), vec![2], false);

        let mut b = MemoryStateMap::new();
        b.add_item(idx(2), vec![2], false);
        b.add_item(idx(1), vec![1], false);

        assert_eq!(a.root_hash(), b.root_hash());

        b.update_item(idx(2), vec![3], false);
        assert_ne!(a.root_hash(), b.root_hash());
    }

    // ---- snapshots ----

    #[test]
    fn snapshot_is_independent() {
        let mut map = MemoryStateMap::new();
        map.add_item(idx(1), vec![1], false);
        let snap = map.snapshot();

        map.update_item(idx(1), vec![2], false);
        map.add_item(idx(2), vec![2], false);

        assert_eq!(snap.peek_item(&idx(1)), Some(vec![1]));
        assert_eq!(snap.item_count(), 1);
        assert_eq!(map.item_count(), 2);
    }

    #[test]
    fn for_each_visits_in_index_order() {
        let mut map = MemoryStateMap::new();
        map.add_item(idx(3), vec![3], false);
        map.add_item(idx(1), vec![1], false);
        map.add_item(idx(2), vec![2], false);

        let mut seen = Vec::new();
        map.for_each(&mut |index, _| seen.push(*index));
        assert_eq!(seen, vec![idx(1), idx(2), idx(3)]);
    }
}
