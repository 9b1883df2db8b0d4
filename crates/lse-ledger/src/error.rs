use lse_types::Hash256;
use thiserror::Error;

/// Contract violations in index derivation.
///
/// These are programming errors at the call site, not runtime conditions:
/// no retry is meaningful for a malformed request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// Both legs of an offer are the native unit; no such offer exists.
    #[error("offer with two native legs")]
    BothLegsNative,

    /// A native leg carried a non-zero issuer (inconsistent representation).
    #[error("native {leg} leg carries an issuer")]
    NativeLegWithIssuer { leg: &'static str },

    /// An issued-currency leg carried the zero issuer.
    #[error("issued-currency {leg} leg missing its issuer")]
    IssuedLegWithoutIssuer { leg: &'static str },

    /// The two legs are identical; an offer must exchange distinct assets.
    #[error("offer legs are identical")]
    IdenticalLegs,
}

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// `write_back` on an absent index without create permission.
    #[error("write-back of non-existent entry {0} without create")]
    MissingEntry(Hash256),

    /// Structural mutation attempted on an immutable ledger.
    #[error("ledger is immutable")]
    Immutable,

    /// Operation requires a closed ledger (e.g. accepting, or building a
    /// successor).
    #[error("ledger is not closed")]
    NotClosed,

    /// The state map rejected an insert/update it should have accepted.
    /// Unrecoverable for the call: a map-level invariant is broken.
    #[error("state map rejected write at {index}: {reason}")]
    StateMapWrite { index: Hash256, reason: &'static str },

    /// A stored blob could not be decoded. The narrow catch-all: only
    /// truly unexpected faults take this path, never plain absence.
    #[error("corrupt entry at {index}: {reason}")]
    Corrupt { index: Hash256, reason: String },

    /// A ledger header failed to decode.
    #[error("bad ledger header: {0}")]
    BadHeader(String),

    /// Entry serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No ledger with the requested hash exists in the object store.
    #[error("ledger {0} not found in object store")]
    NotFound(Hash256),

    /// The object at the requested hash is not a ledger header.
    #[error("object {hash} has kind {kind}, expected a ledger")]
    WrongObjectKind { hash: Hash256, kind: String },

    /// Fault from the object store while loading.
    #[error("object store error: {0}")]
    Store(#[from] lse_store::StoreError),
}
