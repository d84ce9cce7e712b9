//! Dispatch URL extraction from incoming requests.
//!
//! The dispatch URL is `scheme://host/path`. The query string is dropped so
//! patterns only ever see the address of the service, not its parameters.

use axum::http::{header, HeaderMap, Request, Uri};

/// Header carrying the original scheme when the emulator sits behind TLS
/// termination.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Build the dispatch URL for a request.
pub fn request_url<B>(request: &Request<B>) -> String {
    dispatch_url(request.uri(), request.headers())
}

/// Build the dispatch URL from a URI and the request headers.
pub fn dispatch_url(uri: &Uri, headers: &HeaderMap) -> String {
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .or_else(|| uri.scheme_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| "http".to_string());

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
        .to_ascii_lowercase();

    format!("{}://{}{}", scheme, host, uri.path())
}
