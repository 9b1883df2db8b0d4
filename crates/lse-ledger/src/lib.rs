//! Ledger snapshots for the ledger state engine.
//!
//! A [`Ledger`] is one link in the chain: a fixed-width [`LedgerHeader`]
//! plus two content-hashed maps (transactions and account state) behind
//! the [`StateMap`] trait. State entries are typed bags of fields
//! ([`LedgerEntry`]) addressed by deterministic 256-bit indices derived in
//! [`index`].
//!
//! Reads go through the read/create protocol ([`Ledger::state_entry`]):
//! absence and type mismatch are ordinary results, decode failure is the
//! only error. Writes go through [`Ledger::write_back`], which enforces
//! the open → closed → accepted lifecycle.
//!
//! Accepted ledgers persist their headers to the hashed-object store and
//! can be reloaded by hash ([`Ledger::load_by_hash`]).

pub mod entry;
pub mod error;
pub mod header;
pub mod index;
pub mod ledger;
pub mod statemap;

pub use entry::{Field, FieldValue, LedgerEntry};
pub use error::{IndexError, LedgerError};
pub use header::{LedgerHeader, HEADER_LEN, LEDGER_HASH_PREFIX};
pub use index::IndexSpace;
pub use ledger::{CreateMode, EntryLookup, Ledger, WriteBack, DEFAULT_LEDGER_INTERVAL};
pub use statemap::{MemoryStateMap, StateMap};
