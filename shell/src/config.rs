//! Configuration management for the shell.

use docstore_engine::{StoreConfig, DEFAULT_STORE_PATH};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Shell configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file backing the store
    pub store_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self, ConfigError> {
        let store_path = match lookup("DOCSTORE_PATH") {
            Some(path) if path.is_empty() => return Err(ConfigError::EmptyStorePath),
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_STORE_PATH),
        };

        Ok(Self { store_path })
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.store_path.clone())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DOCSTORE_PATH must not be empty")]
    EmptyStorePath,
}
