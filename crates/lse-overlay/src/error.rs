use lse_types::Hash256;
use thiserror::Error;

use crate::entryset::EntryAction;

/// Errors from overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The operation requires the entry to be tracked by the overlay
    /// first (cached or created).
    #[error("entry {0} is not tracked by this overlay")]
    NotTracked(Hash256),

    /// The entry's current action does not permit the requested
    /// transition.
    #[error("cannot {operation} entry {index} in state {action:?}")]
    InvalidTransition {
        index: Hash256,
        action: EntryAction,
        operation: &'static str,
    },

    /// Fault while consulting the base ledger.
    #[error(transparent)]
    Ledger(#[from] lse_ledger::LedgerError),

    /// The base ledger has no entry to cache at the index.
    #[error("no entry at {0} in the base ledger")]
    NotInLedger(Hash256),

    /// The base ledger holds an entry of a different type at the index.
    #[error("entry at {0} has an unexpected type")]
    WrongType(Hash256),

    /// Creation requested for an index that already exists in the base
    /// ledger.
    #[error("entry {0} already exists in the base ledger")]
    AlreadyExists(Hash256),
}
