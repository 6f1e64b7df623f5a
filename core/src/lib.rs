//! Client-side helpers for web pages: a JSON HTTP client and an expiring
//! key/value store, plus query-string and form validation utilities.
//!
//! # Overview
//! `ApiClient` turns a path and `RequestOptions` into an `HttpRequest`,
//! hands it to a `Transport`, and normalizes the `HttpResponse` into parsed
//! JSON, the raw response, or an `ApiError`. `ExpiringStore` wraps any
//! `KeyValueBackend` and adds lazily enforced per-key expiry.
//!
//! # Design
//! - Request building and response parsing are pure; only the transport
//!   performs I/O, so FFI hosts can run the round-trip themselves.
//! - The client and the store share no state.
//! - Backend and clock are injected, so tests run against `MemoryBackend`
//!   and `ManualClock`.

pub mod backend;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod store;
pub mod transport;
pub mod validate;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use client::{parse_response, ApiClient, ApiResponse, RequestBody, RequestOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, StoreConfig};
pub use error::{ApiError, ConfigError, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{build_query, parse_query};
pub use store::{ExpiringStore, StoredEntry};
pub use transport::{Transport, UreqTransport, DEFAULT_BODY_LIMIT};
pub use validate::{validate_email, validate_password, validate_username, PasswordReport};
