use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for store operations.
pub type Result<T> = StdResult<T, Error>;

/// Errors surfaced by a shared store.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on a file-backed store.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// A stored value could not be (de)serialized.
    #[error("JSON error for key '{key}': {source}")]
    Json {
        /// Store key involved.
        key: String,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Cross-process synchronisation failed.
    #[error("Store sync failed: {0}")]
    Sync(String),

    /// The store cannot be reached at all.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
