//! Error types for configuration loading and decoding.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone)]
/// Errors produced while loading settings or decoding persisted configuration.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// Settings file could not be parsed.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// A persisted configuration value does not have the expected shape.
    Decode {
        /// Action kind being decoded, when known.
        kind: Option<String>,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Render a human-friendly error message including location when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse { path, message } => match path {
                Some(p) => format!("Settings parse error at {}\n{}", p.display(), message),
                None => format!("Settings parse error\n{}", message),
            },
            Self::Decode { kind, message } => match kind {
                Some(k) => format!("Invalid '{}' entry: {}", k, message),
                None => format!("Invalid entry: {}", message),
            },
        }
    }

    /// Build a decode error for an optional action kind.
    pub(crate) fn decode(kind: Option<&str>, message: impl Into<String>) -> Self {
        Self::Decode {
            kind: kind.map(str::to_string),
            message: message.into(),
        }
    }
}
