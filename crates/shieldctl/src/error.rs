//! Error handling for the shieldctl binary.

use std::result;

use thiserror::Error;

/// Convenient result type for shieldctl operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that end a shieldctl run.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings file could not be loaded.
    #[error("{}", .0.pretty())]
    Settings(#[from] shield_config::Error),
    /// The store could not be opened or read.
    #[error("Store error: {0}")]
    Store(#[from] shield_store::Error),
    /// Output could not be serialised.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
    /// The store holds configuration problems.
    #[error("{0} problem(s) found in stored configuration")]
    CheckFailed(usize),
}
