//! Error types for the API client, the expiring store and configuration.
//!
//! # Design
//! `Request` displays only the server-supplied message so callers can show
//! it directly. Transport failures keep the underlying error as their
//! source rather than flattening it to a string.

use std::path::PathBuf;

use thiserror::Error;

/// Message used when a failed JSON response carries no usable `message`.
pub const GENERIC_FAILURE: &str = "request failed";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `ApiClient`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, I/O).
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// A JSON response arrived with a status outside 200..=299.
    #[error("{message}")]
    Request {
        status: u16,
        message: String,
        body: serde_json::Value,
    },

    /// The response declared JSON but its body did not parse.
    #[error("invalid JSON response: {0}")]
    Parse(#[source] serde_json::Error),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl ApiError {
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ApiError::Transport(err.into())
    }

    /// HTTP status for `Request` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by store backends and by store writes.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("value could not be serialized: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("store file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
