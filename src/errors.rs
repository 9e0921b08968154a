//! Error types for the cartograph library.

/// Top-level error enum shared across indexing, storage, and query layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A single file could not be extracted. Recoverable: the indexer skips
    /// the file and reports it in the run summary.
    #[error("extraction failed for {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// A read/inspect path resolved outside the indexed project root.
    /// Rejected outright, never clamped back inside.
    #[error("path escapes project root: {0}")]
    OutOfScopePath(String),

    /// The store could not commit. Fatal to the current run; the previously
    /// committed graph remains authoritative after rollback.
    #[error("store failure: {0}")]
    Store(#[from] rusqlite::Error),

    /// Fingerprint/graph inconsistency detected at startup.
    #[error("index corrupt: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
