use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use lse_ledger::{CreateMode, EntryLookup, Ledger, LedgerEntry};
use lse_types::{Hash256, LedgerEntryType};

use crate::error::OverlayError;

/// Relationship of a tracked entry to the base ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Read from the ledger, unchanged so far.
    Cached,
    /// Exists in the ledger; the overlay holds a changed version.
    Modified,
    /// Exists in the ledger; the overlay removes it.
    Deleted,
    /// Does not exist in the ledger; the overlay introduces it.
    Created,
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    entry: LedgerEntry,
    action: EntryAction,
    /// Overlay generation that last handed this entry out.
    seq: u32,
}

/// A transaction's staged view over one ledger.
///
/// Entries are tracked in index order, each with the action that relates
/// it to the base ledger. Nothing here mutates the ledger; the set *is*
/// the transaction's proposed effect.
///
/// The primitive operations (`entry_cache`, `entry_create`,
/// `entry_modify`, `entry_delete`) drive the action state machine for
/// entries the caller already holds. `cache_from_ledger` and
/// `create_fresh` layer the ledger's read/create protocol on top, so a
/// transactor can materialize entries straight from the base.
///
/// Generations: [`EntrySet::duplicate`] produces an independent copy one
/// generation ahead. When an entry stamped by an earlier generation is
/// read again, its stamp advances to the current generation, which is how
/// a duplicated set distinguishes entries it has touched from entries
/// inherited untouched.
pub struct EntrySet {
    ledger: Arc<Ledger>,
    entries: BTreeMap<Hash256, TrackedEntry>,
    seq: u32,
}

impl EntrySet {
    /// Empty overlay over `ledger`, generation zero.
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            entries: BTreeMap::new(),
            seq: 0,
        }
    }

    /// The base ledger.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Current generation.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Independent copy, one generation ahead. Changes to either set are
    /// invisible to the other.
    pub fn duplicate(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            entries: self.entries.clone(),
            seq: self.seq + 1,
        }
    }

    /// Become a copy of `other`, discarding current contents.
    pub fn set_to(&mut self, other: &EntrySet) {
        self.ledger = Arc::clone(&other.ledger);
        self.entries = other.entries.clone();
        self.seq = other.seq;
    }

    /// Exchange contents with `other`. Used to commit a speculative set
    /// built from a duplicate.
    pub fn swap_with(&mut self, other: &mut EntrySet) {
        std::mem::swap(self, other);
    }

    // ---- the action state machine ----

    /// Track `entry` as read-from-ledger. No-op when the index is already
    /// tracked with an equal or stronger action; caching over a staged
    /// delete is a contract violation.
    pub fn entry_cache(&mut self, entry: LedgerEntry) -> Result<(), OverlayError> {
        let seq = self.seq;
        match self.entries.get(entry.index()) {
            None => {
                self.entries.insert(
                    *entry.index(),
                    TrackedEntry {
                        entry,
                        action: EntryAction::Cached,
                        seq,
                    },
                );
                Ok(())
            }
            Some(tracked) => match tracked.action {
                EntryAction::Cached | EntryAction::Modified | EntryAction::Created => Ok(()),
                EntryAction::Deleted => Err(OverlayError::InvalidTransition {
                    index: *entry.index(),
                    action: EntryAction::Deleted,
                    operation: "cache",
                }),
            },
        }
    }

    /// Track `entry` as introduced by this overlay.
    ///
    /// The index must be untracked: creating over any tracked entry,
    /// including one staged for deletion, is a contract violation.
    pub fn entry_create(&mut self, entry: LedgerEntry) -> Result<(), OverlayError> {
        let seq = self.seq;
        match self.entries.get(entry.index()) {
            None => {
                self.entries.insert(
                    *entry.index(),
                    TrackedEntry {
                        entry,
                        action: EntryAction::Created,
                        seq,
                    },
                );
                Ok(())
            }
            Some(tracked) => {
                if tracked.action == EntryAction::Deleted {
                    warn!(index = %entry.index().short_hex(), "create after delete rejected");
                }
                Err(OverlayError::InvalidTransition {
                    index: *entry.index(),
                    action: tracked.action,
                    operation: "create",
                })
            }
        }
    }

    /// Record a changed version of a tracked entry.
    ///
    /// The entry must have been cached or created first; modifying an
    /// untracked or deleted entry is a contract violation.
    pub fn entry_modify(&mut self, entry: LedgerEntry) -> Result<(), OverlayError> {
        let seq = self.seq;
        let tracked = self
            .entries
            .get_mut(entry.index())
            .ok_or(OverlayError::NotTracked(*entry.index()))?;
        match tracked.action {
            EntryAction::Cached | EntryAction::Modified => {
                tracked.entry = entry;
                tracked.action = EntryAction::Modified;
                tracked.seq = seq;
                Ok(())
            }
            // A created entry stays created however often it changes.
            EntryAction::Created => {
                tracked.entry = entry;
                tracked.seq = seq;
                Ok(())
            }
            EntryAction::Deleted => Err(OverlayError::InvalidTransition {
                index: *entry.index(),
                action: EntryAction::Deleted,
                operation: "modify",
            }),
        }
    }

    /// Stage removal of a tracked entry.
    ///
    /// Deleting an entry created by this overlay erases all trace of it;
    /// repeating a delete is a no-op.
    pub fn entry_delete(&mut self, index: &Hash256) -> Result<(), OverlayError> {
        let seq = self.seq;
        let tracked = self
            .entries
            .get_mut(index)
            .ok_or(OverlayError::NotTracked(*index))?;
        match tracked.action {
            EntryAction::Cached | EntryAction::Modified => {
                tracked.action = EntryAction::Deleted;
                tracked.seq = seq;
                Ok(())
            }
            EntryAction::Created => {
                self.entries.remove(index);
                Ok(())
            }
            EntryAction::Deleted => Ok(()),
        }
    }

    // ---- ledger-backed entry points ----

    /// Working copy of the entry at `index`, pulling it from the base
    /// ledger into the overlay on first touch. Re-reading a tracked entry
    /// returns the tracked version (including local modifications), never
    /// a fresh ledger read.
    pub fn cache_from_ledger(
        &mut self,
        entry_type: LedgerEntryType,
        index: &Hash256,
    ) -> Result<LedgerEntry, OverlayError> {
        let seq = self.seq;
        if let Some(tracked) = self.entries.get_mut(index) {
            if tracked.action == EntryAction::Deleted {
                return Err(OverlayError::InvalidTransition {
                    index: *index,
                    action: EntryAction::Deleted,
                    operation: "cache",
                });
            }
            tracked.seq = seq;
            return Ok(tracked.entry.clone());
        }

        match self.ledger.state_entry(index, entry_type, CreateMode::Never)? {
            EntryLookup::Found(entry) => {
                self.entry_cache(entry.clone())?;
                Ok(entry)
            }
            EntryLookup::Missing => Err(OverlayError::NotInLedger(*index)),
            EntryLookup::WrongType => Err(OverlayError::WrongType(*index)),
            EntryLookup::Created(_) => unreachable!("lookup never creates"),
        }
    }

    /// Stage a fresh entry at an index the base ledger does not occupy,
    /// returning a working copy. The index must also be untracked by the
    /// overlay.
    pub fn create_fresh(
        &mut self,
        entry_type: LedgerEntryType,
        index: &Hash256,
    ) -> Result<LedgerEntry, OverlayError> {
        if let Some(tracked) = self.entries.get(index) {
            return Err(OverlayError::InvalidTransition {
                index: *index,
                action: tracked.action,
                operation: "create",
            });
        }

        match self.ledger.state_entry(index, entry_type, CreateMode::Never)? {
            EntryLookup::Missing => {
                let fresh = LedgerEntry::new(entry_type, *index);
                self.entry_create(fresh.clone())?;
                Ok(fresh)
            }
            EntryLookup::Found(_) | EntryLookup::WrongType => {
                Err(OverlayError::AlreadyExists(*index))
            }
            EntryLookup::Created(_) => unreachable!("lookup never creates"),
        }
    }

    // ---- inspection ----

    /// Working copy of a tracked entry and its action, stamping it with
    /// the current generation.
    pub fn get_entry(&mut self, index: &Hash256) -> Option<(LedgerEntry, EntryAction)> {
        let seq = self.seq;
        let tracked = self.entries.get_mut(index)?;
        tracked.seq = seq;
        Some((tracked.entry.clone(), tracked.action))
    }

    /// The action recorded for an index, if tracked.
    pub fn has_entry(&self, index: &Hash256) -> Option<EntryAction> {
        self.entries.get(index).map(|t| t.action)
    }

    /// Generation stamp on a tracked entry. Test and diagnostic hook.
    pub fn entry_seq(&self, index: &Hash256) -> Option<u32> {
        self.entries.get(index).map(|t| t.seq)
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visit tracked entries in index order.
    pub fn for_each(&self, mut f: impl FnMut(&Hash256, &LedgerEntry, EntryAction)) {
        for (index, tracked) in &self.entries {
            f(index, &tracked.entry, tracked.action);
        }
    }

    /// Returns `true` if the two sets touch any common index.
    ///
    /// Walks both ordered maps in lockstep, so disjoint sets cost one pass
    /// over the shorter.
    pub fn intersect(a: &EntrySet, b: &EntrySet) -> bool {
        let mut left = a.entries.keys().peekable();
        let mut right = b.entries.keys().peekable();
        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            match l.cmp(r) {
                std::cmp::Ordering::Less => {
                    left.next();
                }
                std::cmp::Ordering::Greater => {
                    right.next();
                }
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }

    /// JSON rendering of the staged effects, index-ordered.
    pub fn to_json(&self) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = self
            .entries
            .iter()
            .map(|(index, tracked)| {
                let action = match tracked.action {
                    EntryAction::Cached => "cached",
                    EntryAction::Modified => "modified",
                    EntryAction::Deleted => "deleted",
                    EntryAction::Created => "created",
                };
                serde_json::json!({
                    "index": index.to_hex(),
                    "type": tracked.entry.entry_type().name(),
                    "action": action,
                })
            })
            .collect();
        serde_json::json!({
            "ledger_seq": self.ledger.ledger_seq(),
            "nodes": nodes,
        })
    }
}

impl std::fmt::Debug for EntrySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrySet")
            .field("ledger_seq", &self.ledger.ledger_seq())
            .field("seq", &self.seq)
            .field("tracked", &self.entries.len())
            .finish()
    }
}
