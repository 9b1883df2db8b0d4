//! Copy-on-write transactional overlay over a ledger's state entries.
//!
//! An [`EntrySet`] stages a transaction's effects without touching the
//! underlying [`Ledger`]. Each touched entry carries an action
//! ([`EntryAction`]) describing its relationship to the base ledger and a
//! sequence stamp recording which overlay generation last handed it out.
//!
//! The action state machine is the core contract: an entry must be cached
//! before it can be modified or deleted, a staged delete is terminal for
//! its slot within the overlay, and deleting an entry created in this
//! overlay erases all trace of it. Illegal transitions are errors, not
//! silent coercions.

pub mod entryset;
pub mod error;

pub use entryset::{EntryAction, EntrySet};
pub use error::OverlayError;
