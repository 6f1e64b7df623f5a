//! Environment-driven configuration for the client and the store.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::http::{APPLICATION_JSON, CONTENT_TYPE};

pub const BASE_URL_VAR: &str = "PAGEKIT_BASE_URL";
pub const STORE_PATH_VAR: &str = "PAGEKIT_STORE_PATH";

const DEFAULT_STORE_PATH: &str = "pagekit-store.json";

/// Settings for `ApiClient`.
///
/// `base_url` is prepended verbatim to every request path. An empty base
/// means paths are already absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
        }
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Reads `PAGEKIT_BASE_URL` (empty when unset).
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(BASE_URL_VAR).unwrap_or_default();
        Self::from_base_url(base_url)
    }

    fn from_base_url(base_url: String) -> Result<Self, ConfigError> {
        if !base_url.is_empty()
            && !base_url.starts_with("http://")
            && !base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                var: BASE_URL_VAR,
                reason: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }
        Ok(Self::new(base_url))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Settings for the file-backed store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads `PAGEKIT_STORE_PATH` (defaults to `pagekit-store.json`).
    pub fn from_env() -> Self {
        let path = std::env::var_os(STORE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        Self { path }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}
