//! Responses produced by the dispatcher itself.
//!
//! Backend handlers build their own responses; the dispatcher only answers
//! requests that no backend claims.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'static str,
    url: &'a str,
    request_id: &'a str,
}

/// 404 for a URL no backend claims.
pub fn not_found(url: &str, request_id: &str) -> Response {
    let body = ErrorBody {
        error: "BackendNotFound",
        message: "No backend claims this URL",
        url,
        request_id,
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
