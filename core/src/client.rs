//! JSON-by-default HTTP client.
//!
//! # Design
//! `ApiClient` holds a `ClientConfig` and a `Transport` and carries no
//! mutable state between calls. Every call is split into `build_request`,
//! which merges headers and serializes the body, and `parse_response`,
//! which decides between returning the raw response, the parsed JSON value,
//! or a `Request` error. `request` runs both halves around one transport
//! round-trip. There is no retry, timeout or caching layer.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, GENERIC_FAILURE};
use crate::http::{merge_headers, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// Request payload: text is sent as-is, JSON values are serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Text(String),
    Json(Value),
}

impl RequestBody {
    /// Convert any serializable value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(ApiError::Serialization)
    }

    fn into_text(self) -> Result<String, ApiError> {
        match self {
            RequestBody::Text(text) => Ok(text),
            RequestBody::Json(value) => {
                serde_json::to_string(&value).map_err(ApiError::Serialization)
            }
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

/// Per-call options. Headers are merged over the client defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Normalized outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Parsed body of a successful JSON response.
    Json(Value),
    /// A response without a JSON content type, returned untouched.
    Raw(HttpResponse),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&HttpResponse> {
        match self {
            ApiResponse::Raw(response) => Some(response),
            ApiResponse::Json(_) => None,
        }
    }

    /// Deserialize a JSON payload into `T`. Raw responses have their body
    /// parsed as JSON.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value).map_err(ApiError::Parse),
            ApiResponse::Raw(response) => {
                serde_json::from_slice(&response.body).map_err(ApiError::Parse)
            }
        }
    }
}

/// HTTP client bound to a base address.
#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<UreqTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(ClientConfig::new(base_url), UreqTransport::new())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request for `path` without sending it.
    pub fn build_request(&self, path: &str, options: RequestOptions) -> Result<HttpRequest, ApiError> {
        let headers = merge_headers(&self.config.default_headers, &options.headers);
        let body = options.body.map(RequestBody::into_text).transpose()?;
        Ok(HttpRequest {
            method: options.method,
            url: format!("{}{}", self.config.base_url, path),
            headers,
            body,
        })
    }

    /// Normalize a response produced for one of this client's requests.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiResponse, ApiError> {
        parse_response(response)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Send a request and normalize its response.
    pub fn request(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        let method = options.method;
        let result = self
            .build_request(path, options)
            .and_then(|req| {
                tracing::debug!(%method, url = %req.url, "sending request");
                self.transport.execute(&req)
            })
            .and_then(parse_response);
        if let Err(err) = &result {
            tracing::error!(%method, path, error = %err, "API request failed");
        }
        result
    }

    pub fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.request(path, RequestOptions { method: HttpMethod::Get, ..options })
    }

    pub fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(
            path,
            RequestOptions {
                method: HttpMethod::Post,
                body: Some(body.into()),
                ..options
            },
        )
    }

    pub fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(
            path,
            RequestOptions {
                method: HttpMethod::Put,
                body: Some(body.into()),
                ..options
            },
        )
    }

    pub fn delete(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.request(path, RequestOptions { method: HttpMethod::Delete, ..options })
    }
}

/// Map a response to raw, parsed JSON, or a `Request` error.
///
/// Non-JSON responses are returned raw regardless of status.
pub fn parse_response(response: HttpResponse) -> Result<ApiResponse, ApiError> {
    if !response.is_json() {
        return Ok(ApiResponse::Raw(response));
    }

    let data: Value = serde_json::from_slice(&response.body).map_err(ApiError::Parse)?;

    if !response.is_success() {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        return Err(ApiError::Request {
            status: response.status,
            message,
            body: data,
        });
    }

    Ok(ApiResponse::Json(data))
}
