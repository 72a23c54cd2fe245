//! Client configuration.
//!
//! Each setting is resolved in priority order:
//! 1. Command-line flag
//! 2. Environment variable ([`API_URL_ENV`], [`TIMEOUT_ENV`])
//! 3. TOML config file
//! 4. Compiled default
//!
//! Flags and environment arrive merged in [`Overrides`] (clap reads both).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

pub const API_URL_ENV: &str = "SPECKLE_API_URL";
pub const TIMEOUT_ENV: &str = "SPECKLE_TIMEOUT_SECS";

/// Where the processing service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root, without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Settings given on the command line or through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Contents of a TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for malformed TOML or unknown keys.
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&text).map_err(|e| match e {
            ClientError::Config(msg) => ClientError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }
}

impl ClientConfig {
    /// Combine overrides, file settings, and defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an empty base URL or a zero
    /// timeout.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self, ClientError> {
        let base_url = overrides
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ClientError::Config("base_url must not be empty".into()));
        }

        let timeout = match overrides.timeout_secs.or(file.timeout_secs) {
            Some(0) => return Err(ClientError::Config("timeout_secs must be > 0".into())),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self { base_url, timeout })
    }
}
