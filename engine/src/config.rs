//! Store configuration.

use std::path::{Path, PathBuf};

/// File used when no path is configured.
pub const DEFAULT_STORE_PATH: &str = "docstore.json";

/// Where and how a [`Store`](crate::Store) persists its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// JSON file holding the whole store. Read on open, rewritten on every
    /// mutation.
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the state is written to before it replaces `path`.
    pub(crate) fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.as_os_str().to_owned();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}
