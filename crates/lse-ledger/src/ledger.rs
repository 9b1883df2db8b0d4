use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use lse_store::{HashedObjectKind, HashedObjectStore};
use lse_types::{AccountId, Hash160, Hash256, LedgerEntryType};

use crate::entry::{Field, FieldValue, LedgerEntry};
use crate::error::LedgerError;
use crate::header::{LedgerHeader, HEADER_LEN, LEDGER_HASH_PREFIX};
use crate::index::{
    account_root_index, generator_index, nickname_index, ripple_state_index,
};
use crate::statemap::StateMap;

/// Default target seconds between ledger closes.
pub const DEFAULT_LEDGER_INTERVAL: u16 = 30;

/// Whether a state lookup may create the entry it fails to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Absence is a result, not a trigger.
    Never,
    /// Synthesize an empty entry of the expected type at the index.
    /// The entry exists only in the caller's hands until written back.
    IfMissing,
}

/// Outcome of a state lookup.
///
/// Only the decode path can error; everything else a lookup can say is an
/// expected result and shows up here.
#[derive(Debug)]
pub enum EntryLookup {
    /// The entry exists and has the expected type.
    Found(LedgerEntry),
    /// Nothing at the index; a fresh entry was synthesized.
    Created(LedgerEntry),
    /// Nothing at the index and creation was not requested.
    Missing,
    /// An entry exists but is of a different type. The caller asked a
    /// malformed question; the entry itself is untouched.
    WrongType,
}

impl EntryLookup {
    /// The entry, if the lookup produced one.
    pub fn entry(self) -> Option<LedgerEntry> {
        match self {
            Self::Found(e) | Self::Created(e) => Some(e),
            Self::Missing | Self::WrongType => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Outcome of a successful write-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBack {
    Created,
    Updated,
}

/// One ledger in the chain: a header plus two content-hashed maps.
///
/// Lifecycle: a ledger starts open and mutable, is *closed* (its contents
/// frozen for consensus), then *accepted* (final, immutable). Every
/// mutating method checks the flags, so a handle to an accepted ledger is
/// safe to share read-only.
///
/// The maps sit behind their own locks; header fields are plain data owned
/// by the handle. Mutating methods take `&mut self`, so concurrent readers
/// of one ledger are fine and writers are serialized by ownership.
pub struct Ledger {
    parent_hash: Hash256,
    hash: Hash256,
    trans_hash: Hash256,
    account_hash: Hash256,
    total_coins: u64,
    close_time: u64,
    ledger_seq: u32,
    ledger_interval: u16,
    closed: bool,
    accepted: bool,
    immutable: bool,
    valid_hash: bool,
    transaction_map: Mutex<Box<dyn StateMap>>,
    account_state_map: Mutex<Box<dyn StateMap>>,
}

impl Ledger {
    /// Build the genesis ledger: sequence zero, every native unit in the
    /// master account's root.
    pub fn genesis(
        master: AccountId,
        starting_coins: u64,
        transaction_map: Box<dyn StateMap>,
        account_state_map: Box<dyn StateMap>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self {
            parent_hash: Hash256::zero(),
            hash: Hash256::zero(),
            trans_hash: Hash256::zero(),
            account_hash: Hash256::zero(),
            total_coins: starting_coins,
            close_time: 0,
            ledger_seq: 0,
            ledger_interval: DEFAULT_LEDGER_INTERVAL,
            closed: false,
            accepted: false,
            immutable: false,
            valid_hash: false,
            transaction_map: Mutex::new(transaction_map),
            account_state_map: Mutex::new(account_state_map),
        };

        let index = account_root_index(&master);
        let mut root = LedgerEntry::new(LedgerEntryType::AccountRoot, index);
        root.set(Field::Account, FieldValue::Account(master))
            .set(Field::Balance, FieldValue::U64(starting_coins))
            .set(Field::Sequence, FieldValue::U32(1));
        ledger.write_back(CreateMode::IfMissing, &root)?;
        ledger.update_hash();
        Ok(ledger)
    }

    /// Rebuild an accepted ledger from its header. The maps are supplied by
    /// the caller (typically still synchronizing); roots that disagree with
    /// the header are logged, not rejected.
    pub fn from_header(
        header: LedgerHeader,
        transaction_map: Box<dyn StateMap>,
        account_state_map: Box<dyn StateMap>,
    ) -> Self {
        let hash = header.hash();
        if transaction_map.root_hash() != header.trans_hash
            || account_state_map.root_hash() != header.account_hash
        {
            debug!(
                ledger_seq = header.ledger_seq,
                "map roots do not (yet) match header roots"
            );
        }
        Self {
            parent_hash: header.parent_hash,
            hash,
            trans_hash: header.trans_hash,
            account_hash: header.account_hash,
            total_coins: header.total_coins,
            close_time: header.close_time,
            ledger_seq: header.ledger_seq,
            ledger_interval: header.ledger_interval,
            closed: true,
            accepted: true,
            immutable: true,
            valid_hash: true,
            transaction_map: Mutex::new(transaction_map),
            account_state_map: Mutex::new(account_state_map),
        }
    }

    /// Rebuild an accepted ledger from its wire-form header.
    pub fn from_header_bytes(
        bytes: &[u8],
        transaction_map: Box<dyn StateMap>,
        account_state_map: Box<dyn StateMap>,
    ) -> Result<Self, LedgerError> {
        let header = LedgerHeader::from_bytes(bytes)?;
        Ok(Self::from_header(header, transaction_map, account_state_map))
    }

    /// Open the successor of a closed ledger: sequence advances, the
    /// account state carries over as a snapshot, transactions start empty.
    pub fn following(
        prev: &Ledger,
        transaction_map: Box<dyn StateMap>,
    ) -> Result<Self, LedgerError> {
        if !prev.closed {
            return Err(LedgerError::NotClosed);
        }
        debug_assert!(prev.valid_hash, "closed ledger must carry a valid hash");
        let account_state_map = prev
            .account_state_map
            .lock()
            .expect("state map lock poisoned")
            .snapshot();
        Ok(Self {
            parent_hash: prev.hash,
            hash: Hash256::zero(),
            trans_hash: Hash256::zero(),
            account_hash: Hash256::zero(),
            total_coins: prev.total_coins,
            close_time: prev.close_time + u64::from(prev.ledger_interval),
            ledger_seq: prev.ledger_seq + 1,
            ledger_interval: prev.ledger_interval,
            closed: false,
            accepted: false,
            immutable: false,
            valid_hash: false,
            transaction_map: Mutex::new(transaction_map),
            account_state_map: Mutex::new(account_state_map),
        })
    }

    /// Load an accepted ledger's header from the object store by hash.
    ///
    /// The stored payload is the domain prefix followed by the wire-form
    /// header, so the content address equals the ledger hash.
    pub fn load_by_hash(
        store: &HashedObjectStore,
        hash: &Hash256,
        transaction_map: Box<dyn StateMap>,
        account_state_map: Box<dyn StateMap>,
    ) -> Result<Self, LedgerError> {
        let object = store
            .retrieve(hash)?
            .ok_or(LedgerError::NotFound(*hash))?;
        if object.kind() != HashedObjectKind::Ledger {
            return Err(LedgerError::WrongObjectKind {
                hash: *hash,
                kind: object.kind().to_string(),
            });
        }
        let payload = object.data();
        if payload.len() != LEDGER_HASH_PREFIX.len() + HEADER_LEN
            || payload[..LEDGER_HASH_PREFIX.len()] != LEDGER_HASH_PREFIX
        {
            return Err(LedgerError::BadHeader(
                "stored payload is not a prefixed ledger header".into(),
            ));
        }
        let ledger = Self::from_header_bytes(
            &payload[LEDGER_HASH_PREFIX.len()..],
            transaction_map,
            account_state_map,
        )?;
        debug_assert_eq!(ledger.hash, *hash);
        Ok(ledger)
    }

    /// Queue this ledger's header into the object store. Returns `false`
    /// if the store already knew it. Call on closed ledgers; the hash must
    /// be current.
    pub fn persist(&self, store: &Arc<HashedObjectStore>) -> Result<bool, LedgerError> {
        let mut payload = LEDGER_HASH_PREFIX.to_vec();
        payload.extend_from_slice(&self.header().to_bytes());
        let queued = store.store(
            HashedObjectKind::Ledger,
            self.ledger_seq,
            payload,
            self.hash,
        )?;
        Ok(queued)
    }

    // ---- header and flags ----

    /// Snapshot of the current header fields. Map roots are as of the last
    /// `update_hash`.
    pub fn header(&self) -> LedgerHeader {
        LedgerHeader {
            ledger_seq: self.ledger_seq,
            total_coins: self.total_coins,
            parent_hash: self.parent_hash,
            trans_hash: self.trans_hash,
            account_hash: self.account_hash,
            close_time: self.close_time,
            ledger_interval: self.ledger_interval,
        }
    }

    /// Recompute the map roots and the ledger hash.
    pub fn update_hash(&mut self) {
        if !self.immutable {
            self.trans_hash = self
                .transaction_map
                .lock()
                .expect("transaction map lock poisoned")
                .root_hash();
            self.account_hash = self
                .account_state_map
                .lock()
                .expect("state map lock poisoned")
                .root_hash();
        }
        self.hash = self.header().hash();
        self.valid_hash = true;
    }

    /// Close the ledger at the given time. Contents are frozen except for
    /// state write-backs, which consensus still applies.
    pub fn close(&mut self, close_time: u64) -> Result<(), LedgerError> {
        if self.immutable {
            return Err(LedgerError::Immutable);
        }
        self.closed = true;
        self.close_time = close_time;
        self.update_hash();
        Ok(())
    }

    /// Mark a closed ledger accepted and immutable.
    pub fn set_accepted(&mut self) -> Result<(), LedgerError> {
        if !self.closed {
            return Err(LedgerError::NotClosed);
        }
        self.update_hash();
        self.accepted = true;
        self.immutable = true;
        Ok(())
    }

    pub fn hash(&self) -> &Hash256 {
        debug_assert!(self.valid_hash, "hash read before update_hash");
        &self.hash
    }

    pub fn parent_hash(&self) -> &Hash256 {
        &self.parent_hash
    }

    pub fn ledger_seq(&self) -> u32 {
        self.ledger_seq
    }

    pub fn total_coins(&self) -> u64 {
        self.total_coins
    }

    pub fn close_time(&self) -> u64 {
        self.close_time
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    // ---- transactions ----

    /// Record a transaction blob in the open ledger.
    pub fn add_transaction(&mut self, txn_id: Hash256, blob: Vec<u8>) -> Result<(), LedgerError> {
        if self.accepted {
            return Err(LedgerError::Immutable);
        }
        let mut map = self
            .transaction_map
            .lock()
            .expect("transaction map lock poisoned");
        if !map.add_item(txn_id, blob, false) {
            return Err(LedgerError::StateMapWrite {
                index: txn_id,
                reason: "transaction already present",
            });
        }
        self.valid_hash = false;
        Ok(())
    }

    /// Returns `true` if the ledger contains the transaction.
    pub fn has_transaction(&self, txn_id: &Hash256) -> bool {
        self.transaction_map
            .lock()
            .expect("transaction map lock poisoned")
            .has_item(txn_id)
    }

    // ---- state entries: the read/create protocol ----

    /// Look up a state entry by index, checking its type and optionally
    /// synthesizing it when absent.
    ///
    /// Absence and type mismatch are results; only a blob that fails to
    /// decode is an error.
    pub fn state_entry(
        &self,
        index: &Hash256,
        expected: LedgerEntryType,
        create: CreateMode,
    ) -> Result<EntryLookup, LedgerError> {
        let blob = {
            let map = self
                .account_state_map
                .lock()
                .expect("state map lock poisoned");
            map.peek_item(index)
        };
        match blob {
            None => match create {
                CreateMode::Never => {
                    debug!(index = %index.short_hex(), %expected, "entry not found");
                    Ok(EntryLookup::Missing)
                }
                CreateMode::IfMissing => {
                    Ok(EntryLookup::Created(LedgerEntry::new(expected, *index)))
                }
            },
            Some(bytes) => {
                let entry = LedgerEntry::from_bytes(*index, &bytes)?;
                if entry.entry_type() != expected {
                    warn!(
                        index = %index.short_hex(),
                        found = %entry.entry_type(),
                        %expected,
                        "entry type mismatch"
                    );
                    Ok(EntryLookup::WrongType)
                } else {
                    Ok(EntryLookup::Found(entry))
                }
            }
        }
    }

    /// Write a (possibly new) entry into the account state.
    ///
    /// With `CreateMode::Never` the entry must already exist. A map that
    /// rejects the write after these checks has broken an invariant and
    /// the call errors hard.
    pub fn write_back(
        &mut self,
        create: CreateMode,
        entry: &LedgerEntry,
    ) -> Result<WriteBack, LedgerError> {
        if self.immutable {
            return Err(LedgerError::Immutable);
        }
        let blob = entry.to_bytes()?;
        let mut map = self
            .account_state_map
            .lock()
            .expect("state map lock poisoned");
        if map.has_item(entry.index()) {
            if !map.update_item(*entry.index(), blob, true) {
                return Err(LedgerError::StateMapWrite {
                    index: *entry.index(),
                    reason: "update of existing entry rejected",
                });
            }
            drop(map);
            self.valid_hash = false;
            Ok(WriteBack::Updated)
        } else {
            if create == CreateMode::Never {
                return Err(LedgerError::MissingEntry(*entry.index()));
            }
            if !map.add_item(*entry.index(), blob, false) {
                return Err(LedgerError::StateMapWrite {
                    index: *entry.index(),
                    reason: "insert of new entry rejected",
                });
            }
            drop(map);
            self.valid_hash = false;
            Ok(WriteBack::Created)
        }
    }

    /// Remove an entry from the account state.
    pub fn erase_entry(&mut self, index: &Hash256) -> Result<(), LedgerError> {
        if self.immutable {
            return Err(LedgerError::Immutable);
        }
        let mut map = self
            .account_state_map
            .lock()
            .expect("state map lock poisoned");
        if !map.delete_item(index) {
            return Err(LedgerError::MissingEntry(*index));
        }
        drop(map);
        self.valid_hash = false;
        Ok(())
    }

    // ---- typed lookups ----

    /// An account's root entry.
    pub fn account_root(
        &self,
        account: &AccountId,
        create: CreateMode,
    ) -> Result<EntryLookup, LedgerError> {
        self.state_entry(
            &account_root_index(account),
            LedgerEntryType::AccountRoot,
            create,
        )
    }

    /// A generator map by generator identifier.
    pub fn generator_map(
        &self,
        generator: &Hash160,
        create: CreateMode,
    ) -> Result<EntryLookup, LedgerError> {
        self.state_entry(
            &generator_index(generator),
            LedgerEntryType::GeneratorMap,
            create,
        )
    }

    /// A nickname entry by nickname digest.
    pub fn nickname(
        &self,
        nickname: &Hash256,
        create: CreateMode,
    ) -> Result<EntryLookup, LedgerError> {
        self.state_entry(
            &nickname_index(nickname),
            LedgerEntryType::Nickname,
            create,
        )
    }

    /// The trust line between two accounts in one currency.
    pub fn ripple_state(
        &self,
        a: &AccountId,
        b: &AccountId,
        currency: &lse_types::Currency,
        create: CreateMode,
    ) -> Result<EntryLookup, LedgerError> {
        self.state_entry(
            &ripple_state_index(a, b, currency),
            LedgerEntryType::RippleState,
            create,
        )
    }

    /// A directory page by precomputed index.
    pub fn dir_node(
        &self,
        index: &Hash256,
        create: CreateMode,
    ) -> Result<EntryLookup, LedgerError> {
        self.state_entry(index, LedgerEntryType::DirectoryNode, create)
    }

    /// An offer by precomputed index.
    pub fn offer(&self, index: &Hash256, create: CreateMode) -> Result<EntryLookup, LedgerError> {
        self.state_entry(index, LedgerEntryType::Offer, create)
    }

    /// JSON rendering of the header plus lifecycle flags.
    pub fn to_json(&self) -> serde_json::Value {
        let mut json = self.header().to_json();
        let map = json.as_object_mut().expect("header json is an object");
        map.insert("closed".into(), serde_json::json!(self.closed));
        map.insert("accepted".into(), serde_json::json!(self.accepted));
        json
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("ledger_seq", &self.ledger_seq)
            .field("hash", &self.hash)
            .field("closed", &self.closed)
            .field("accepted", &self.accepted)
            .finish_non_exhaustive()
    }
}
