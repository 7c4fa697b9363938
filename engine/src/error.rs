//! Error types for the docstore engine.
//!
//! Lookups never fail: a missing collection or document is an ordinary
//! `None`, `false` or empty result. Errors only come out of persistence.

use std::path::PathBuf;
use thiserror::Error;

/// All possible errors from the docstore engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode store state: {0}")]
    Encode(String),

    #[error("failed to decode store state: {0}")]
    Decode(String),

    #[error("document stored under key '{key}' carries id '{id}'")]
    KeyMismatch { key: String, id: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
