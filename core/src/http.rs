//! HTTP request and response types described as plain data.
//!
//! # Design
//! `ApiClient` builds an `HttpRequest` and normalizes an `HttpResponse`
//! without touching the network itself. A `Transport` (or an FFI host)
//! executes the round-trip in between, so both halves stay deterministic and
//! testable.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross FFI
//! boundaries without lifetime concerns.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Header name used for the JSON default and for response sniffing.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Media type sent by default and recognized on responses.
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is the full target address (base address plus path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// `body` holds the bytes exactly as received; it need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// True when the declared content type mentions `application/json`.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(APPLICATION_JSON))
    }

    /// Status in 200..=299.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Merge `overrides` over `base`. Names compare case-insensitively; an
/// override replaces the base entry in place and keeps the override's
/// spelling. New names are appended in order.
pub fn merge_headers(
    base: &[(String, String)],
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged = base.to_vec();
    for (name, value) in overrides {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => *slot = (name.clone(), value.clone()),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert_eq!("PUT".parse::<HttpMethod>().unwrap(), HttpMethod::Put);
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn merge_overrides_existing_header_ignoring_case() {
        let base = vec![pair("Content-Type", "application/json")];
        let merged = merge_headers(&base, &[pair("content-type", "text/plain")]);
        assert_eq!(merged, vec![pair("content-type", "text/plain")]);
    }

    #[test]
    fn merge_appends_new_headers_in_order() {
        let base = vec![pair("Content-Type", "application/json")];
        let merged = merge_headers(
            &base,
            &[pair("Authorization", "Bearer t"), pair("X-Trace", "1")],
        );
        assert_eq!(
            merged,
            vec![
                pair("Content-Type", "application/json"),
                pair("Authorization", "Bearer t"),
                pair("X-Trace", "1"),
            ]
        );
    }

    #[test]
    fn json_detection_accepts_charset_suffix() {
        let response = HttpResponse {
            status: 200,
            headers: vec![pair("content-type", "application/json; charset=utf-8")],
            body: b"{}".to_vec(),
        };
        assert!(response.is_json());
        assert!(response.is_success());
    }

    #[test]
    fn missing_content_type_is_not_json() {
        let response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(!response.is_json());
    }

    #[test]
    fn text_replaces_invalid_utf8() {
        let response = HttpResponse {
            status: 200,
            headers: vec![pair("Content-Type", "image/png")],
            body: vec![0x89, b'P', b'N', b'G', 0xFF],
        };
        assert_eq!(response.text(), "\u{FFFD}PNG\u{FFFD}");
    }
}
