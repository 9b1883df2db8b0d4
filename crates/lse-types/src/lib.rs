//! Foundation types for the ledger state engine (LSE).
//!
//! This crate provides the fixed-width digest and identifier types used
//! throughout the engine. Every other LSE crate depends on `lse-types`.
//!
//! # Key Types
//!
//! - [`Hash256`] — 256-bit digest; the key space of state maps and the
//!   content address of stored objects
//! - [`Hash160`] — 160-bit digest; offer-book bases and similar short indices
//! - [`AccountId`] — 160-bit account identifier
//! - [`Currency`] — 160-bit currency tag; the all-zero tag is the native unit
//! - [`LedgerEntryType`] — variant tag of a typed state object

pub mod account;
pub mod entry_type;
pub mod error;
pub mod hash;

pub use account::{AccountId, Currency};
pub use entry_type::LedgerEntryType;
pub use error::TypeError;
pub use hash::{Hash160, Hash256};
