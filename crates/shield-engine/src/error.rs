use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the shield engine.
///
/// None of these reach the host: the engine logs them at the action or
/// lookup boundary and falls back to a safe default.
#[derive(Debug, Error)]
pub enum Error {
    /// No configuration exists for this event.
    #[error("No shield configuration")]
    ConfigAbsent,

    /// An action entry is missing a required field or has the wrong shape.
    #[error("Malformed '{kind}' action: {reason}")]
    ActionMalformed {
        /// Action kind, or `?` when the entry had no type.
        kind: String,
        /// Decoder message.
        reason: String,
    },

    /// A URI template resolved to something that is not a URI.
    #[error("Invalid URI '{0}'")]
    InvalidUri(String),

    /// The shared store could not be synchronised or read.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] shield_store::Error),

    /// An action kind this engine does not know.
    #[error("Unknown action kind '{0}'")]
    UnknownActionKind(String),

    /// A notification collaborator rejected a request.
    #[error("Notification failed: {0}")]
    Notification(String),

    /// The UI-affine queue has shut down.
    #[error("UI queue closed")]
    ChannelClosed,
}

impl From<shield_config::Error> for Error {
    fn from(e: shield_config::Error) -> Self {
        match e {
            shield_config::Error::Decode { kind, message } => Self::ActionMalformed {
                kind: kind.unwrap_or_else(|| "?".to_string()),
                reason: message,
            },
            other => Self::ActionMalformed {
                kind: "?".to_string(),
                reason: other.pretty(),
            },
        }
    }
}
