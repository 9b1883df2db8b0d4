use lse_types::Hash256;

/// Errors from a durable backend.
///
/// `get` distinguishes "not found" (an `Ok(None)`) from genuine faults;
/// everything here is a fault. The store escalates backend faults instead
/// of conflating them with misses.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// I/O error from the underlying storage engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be decoded or failed its digest check.
    #[error("corrupt record for {hash}: {reason}")]
    Corrupt { hash: Hash256, reason: String },

    /// The backend is unavailable or misconfigured.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The caller-supplied hash does not match the content digest.
    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        expected: Hash256,
        computed: Hash256,
    },

    /// Fault from the durable backend (never a plain miss).
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
