//! C-ABI wrapper around `pagekit-core`.
//!
//! # Overview
//! Exposes the API client and the expiring store through `extern "C"`
//! functions. Hosts can either let the library perform the HTTP round-trip
//! (`pagekit_request`) or do the I/O themselves between
//! `pagekit_build_request` and `pagekit_parse_response`.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Parse and request calls return one `FfiApiResult` envelope; store calls
//!   return an `FfiErrorCode` directly.
//! - The C caller owns all returned pointers and must call the matching
//!   `pagekit_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use pagekit_core::{
    ApiClient, ExpiringStore, FileBackend, HttpResponse, RequestBody, RequestOptions,
};

use types::*;

/// Borrow a C string as `&str`. Null and invalid UTF-8 both yield `None`.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `ApiClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `pagekit_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_client_new(base_url: *const c_char) -> *mut FfiApiClient {
    catch_unwind(|| {
        let Some(url) = (unsafe { str_arg(base_url) }) else {
            return std::ptr::null_mut();
        };
        let client = ApiClient::new(url);
        Box::into_raw(Box::new(FfiApiClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `pagekit_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Assemble `RequestOptions` from C arguments. `body` is sent as text.
unsafe fn options_from_c(
    method: FfiHttpMethod,
    headers: *const FfiHeader,
    headers_len: u32,
    body: *const c_char,
) -> Result<RequestOptions, &'static str> {
    let mut options = RequestOptions::new(method.into());

    if !headers.is_null() && headers_len > 0 {
        let headers = unsafe { std::slice::from_raw_parts(headers, headers_len as usize) };
        for h in headers {
            let key = unsafe { str_arg(h.key) }.ok_or("invalid header name")?;
            let value = unsafe { str_arg(h.value) }.ok_or("invalid header value")?;
            options = options.with_header(key, value);
        }
    }

    if !body.is_null() {
        let text = unsafe { str_arg(body) }.ok_or("body is not valid UTF-8")?;
        options.body = Some(RequestBody::Text(text.to_string()));
    }

    Ok(options)
}

/// Build an HTTP request without sending it.
///
/// `headers` may be null when `headers_len` is 0; `body` may be null.
/// Returns null if `client` or `path` is null or an argument is not valid
/// UTF-8. The caller must free the result with `pagekit_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_build_request(
    client: *const FfiApiClient,
    method: FfiHttpMethod,
    path: *const c_char,
    headers: *const FfiHeader,
    headers_len: u32,
    body: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(path) = (unsafe { str_arg(path) }) else {
            return std::ptr::null_mut();
        };
        let Ok(options) = (unsafe { options_from_c(method, headers, headers_len, body) }) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_request(path, options) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() || resp.body_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len) }.to_vec()
    };
    let headers = unsafe { str_arg(resp.content_type) }
        .map(|ct| vec![("Content-Type".to_string(), ct.to_string())])
        .unwrap_or_default();
    HttpResponse {
        status: resp.status,
        headers,
        body,
    }
}

/// Normalize a response the host obtained for a built request.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_parse_response(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiApiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiApiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiApiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        FfiApiResult::from_core(client.inner.parse_response(ffi_response_to_core(resp)))
    }))
    .unwrap_or_else(|_| FfiApiResult::panic("panic in pagekit_parse_response"))
}

/// Send a request over the network and normalize the response.
///
/// Blocks the calling thread for the duration of the round-trip.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_request(
    client: *const FfiApiClient,
    method: FfiHttpMethod,
    path: *const c_char,
    headers: *const FfiHeader,
    headers_len: u32,
    body: *const c_char,
) -> *mut FfiApiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiApiResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let Some(path) = (unsafe { str_arg(path) }) else {
            return FfiApiResult::null_arg("path");
        };
        match unsafe { options_from_c(method, headers, headers_len, body) } {
            Ok(options) => FfiApiResult::from_core(client.inner.request(path, options)),
            Err(msg) => FfiApiResult::failure(FfiErrorCode::InvalidArg, msg),
        }
    }))
    .unwrap_or_else(|_| FfiApiResult::panic("panic in pagekit_request"))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Open (or create) a file-backed expiring store at `path`.
///
/// Returns null if `path` is null or the file cannot be opened. The caller
/// must free the handle with `pagekit_store_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_store_open(path: *const c_char) -> *mut FfiStore {
    catch_unwind(|| {
        let Some(path) = (unsafe { str_arg(path) }) else {
            return std::ptr::null_mut();
        };
        match FileBackend::open(path) {
            Ok(backend) => Box::into_raw(Box::new(FfiStore {
                inner: ExpiringStore::new(backend),
            })),
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to open store");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a store handle. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_store_free(store: *mut FfiStore) {
    if !store.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(store) });
        }));
    }
}

/// Store the JSON text `value_json` under `key`. `ttl_ms` of 0 never
/// expires.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_store_set(
    store: *mut FfiStore,
    key: *const c_char,
    value_json: *const c_char,
    ttl_ms: u64,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() || key.is_null() || value_json.is_null() {
            return FfiErrorCode::NullArg;
        }
        let store = unsafe { &mut *store };
        let (Some(key), Some(text)) = (unsafe { str_arg(key) }, unsafe { str_arg(value_json) })
        else {
            return FfiErrorCode::InvalidArg;
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
            return FfiErrorCode::InvalidArg;
        };
        let ttl = (ttl_ms > 0).then(|| Duration::from_millis(ttl_ms));
        match store.inner.set(key, &value, ttl) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// Read the value under `key` as JSON text.
///
/// Returns null when the key is absent, expired or unreadable. The caller
/// must free a non-null result with `pagekit_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_store_get(store: *mut FfiStore, key: *const c_char) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() {
            return std::ptr::null_mut();
        }
        let store = unsafe { &mut *store };
        let Some(key) = (unsafe { str_arg(key) }) else {
            return std::ptr::null_mut();
        };
        match store.inner.get::<serde_json::Value>(key) {
            Some(value) => c_string(value.to_string()),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn pagekit_store_remove(store: *mut FfiStore, key: *const c_char) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() || key.is_null() {
            return FfiErrorCode::NullArg;
        }
        let store = unsafe { &mut *store };
        let Some(key) = (unsafe { str_arg(key) }) else {
            return FfiErrorCode::InvalidArg;
        };
        match store.inner.remove(key) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

#[unsafe(no_mangle)]
pub extern "C" fn pagekit_store_clear(store: *mut FfiStore) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if store.is_null() {
            return FfiErrorCode::NullArg;
        }
        let store = unsafe { &mut *store };
        match store.inner.clear() {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `pagekit_build_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let req = unsafe { Box::from_raw(req) };
        pagekit_free_string(req.url);
        pagekit_free_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                pagekit_free_string(h.key);
                pagekit_free_string(h.value);
            }
        }
    }));
}

/// Free an `FfiApiResult` returned by `pagekit_parse_response` or
/// `pagekit_request`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_free_result(result: *mut FfiApiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        pagekit_free_string(result.error_message);
        unsafe { free_bytes(result.payload, result.payload_len) };
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pagekit_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { CString::from_raw(s) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
