//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion helpers live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use pagekit_core::{
    ApiClient, ApiError, ApiResponse, ExpiringStore, FileBackend, HttpMethod, HttpRequest,
    StoreError,
};

/// Opaque handle to an `ApiClient`.
pub struct FfiApiClient {
    pub(crate) inner: ApiClient,
}

/// Opaque handle to a file-backed `ExpiringStore`.
pub struct FfiStore {
    pub(crate) inner: ExpiringStore<FileBackend>,
}

/// Lossy `CString` construction: interior NULs are dropped rather than
/// failing the whole call.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut bytes: Vec<u8> = s.into().into_bytes();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Copy `bytes` into a NUL-terminated heap buffer. Returns the pointer and
/// the length without the terminator; release with `free_bytes`.
pub(crate) fn c_bytes(bytes: Vec<u8>) -> (*mut c_char, usize) {
    let len = bytes.len();
    let mut buf = bytes;
    buf.push(0);
    (Box::into_raw(buf.into_boxed_slice()) as *mut c_char, len)
}

/// Release a buffer from `c_bytes`. `len` excludes the terminator.
///
/// # Safety
/// `ptr` must be null or come from `c_bytes` with the same `len`.
pub(crate) unsafe fn free_bytes(ptr: *mut c_char, len: usize) {
    if !ptr.is_null() {
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr as *mut u8, len + 1)) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `pagekit_build_request`. The C caller executes the request and
/// passes the response back through `pagekit_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = c_string(req.url);
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller builds this after executing a request and passes a pointer
/// to `pagekit_parse_response`. The FFI layer reads but does not free these
/// fields. `content_type` may be null. `body` points at `body_len` bytes,
/// which may contain NULs and need not be UTF-8; it may be null when
/// `body_len` is 0.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub content_type: *const c_char,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiApiResult` and by store functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    Request = 2,
    Parse = 3,
    Serialization = 4,
    Storage = 5,
    InvalidArg = 6,
    NullArg = 7,
    Panic = 8,
}

impl From<&StoreError> for FfiErrorCode {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::Serialization(_) => FfiErrorCode::Serialization,
            StoreError::Io(_) | StoreError::Corrupt { .. } => FfiErrorCode::Storage,
        }
    }
}

/// What `FfiApiResult::payload` holds.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPayloadKind {
    /// No payload (errors).
    None = 0,
    /// `payload` is JSON text of the parsed body.
    Json = 1,
    /// `payload` is the unparsed response body; `http_status` is set.
    Raw = 2,
}

/// Result envelope for parse and request operations.
///
/// On success `error_code` is `Ok` and `payload` holds `payload_len` bytes
/// tagged by `payload_kind`, followed by a NUL terminator. Raw payloads are
/// the response body byte for byte and may contain NULs. On failure
/// `error_message` is a human-readable C string and `payload` is null.
/// `http_status` is set for raw payloads and for `Request` errors.
#[repr(C)]
pub struct FfiApiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub payload_kind: FfiPayloadKind,
    pub payload: *mut c_char,
    pub payload_len: usize,
}

impl FfiApiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        http_status: u16,
        payload_kind: FfiPayloadKind,
        payload: Option<Vec<u8>>,
    ) -> *mut Self {
        let (payload, payload_len) = payload.map_or((std::ptr::null_mut(), 0), c_bytes);
        Box::into_raw(Box::new(FfiApiResult {
            error_code,
            error_message,
            http_status,
            payload_kind,
            payload,
            payload_len,
        }))
    }

    pub(crate) fn from_core(result: Result<ApiResponse, ApiError>) -> *mut Self {
        match result {
            Ok(ApiResponse::Json(value)) => Self::boxed(
                FfiErrorCode::Ok,
                std::ptr::null_mut(),
                0,
                FfiPayloadKind::Json,
                Some(value.to_string().into_bytes()),
            ),
            Ok(ApiResponse::Raw(response)) => Self::boxed(
                FfiErrorCode::Ok,
                std::ptr::null_mut(),
                response.status,
                FfiPayloadKind::Raw,
                Some(response.body),
            ),
            Err(err) => Self::from_error(err),
        }
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::Request { status, .. } => (FfiErrorCode::Request, *status),
            ApiError::Parse(_) => (FfiErrorCode::Parse, 0),
            ApiError::Serialization(_) => (FfiErrorCode::Serialization, 0),
        };
        Self::boxed(
            error_code,
            c_string(err.to_string()),
            http_status,
            FfiPayloadKind::None,
            None,
        )
    }

    pub(crate) fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Self::boxed(
            error_code,
            c_string(msg),
            0,
            FfiPayloadKind::None,
            None,
        )
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }
}
