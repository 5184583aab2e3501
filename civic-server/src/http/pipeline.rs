//! Request pipeline stages
//!
//! Per request, in order:
//!
//! 1. CORS (`cors::layer`)
//! 2. Body parsing ([`parse_json_body`])
//! 3. Connection-ensure ([`ensure_connection`]), best-effort
//! 4. Route dispatch
//! 5. Not-found ([`not_found`])
//! 6. Error formatting ([`format_errors`]), wrapping everything after CORS
//!
//! Panics inside handlers are caught per request ([`panic_response`]) and go
//! through the same formatter.

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use serde_json::{json, Value};

use super::error::{ApiError, ErrorReport};
use super::extractors::ParsedBody;
use crate::state::AppState;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 100 * 1024;

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json")
                || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}

/// Decode JSON request bodies up front; malformed input never reaches a handler.
pub async fn parse_json_body(request: Request, next: Next) -> Response {
    if !is_json(request.headers()) {
        return next.run(request).await;
    }

    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_BODY_BYTES) {
        return ApiError::PayloadTooLarge.into_response();
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) if exceeded_limit(&e) => return ApiError::PayloadTooLarge.into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            return ApiError::BadRequest(format!("Failed to read request body: {}", e))
                .into_response();
        }
    };

    if !bytes.is_empty() {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                parts.extensions.insert(ParsedBody(Arc::new(value)));
            }
            Err(e) => {
                return ApiError::BadRequest(format!("Malformed JSON body: {}", e)).into_response();
            }
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn exceeded_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Try to have a database connection ready. Never blocks dispatch on failure:
/// routes that need the database report their own unavailable error, and
/// routes that don't (health checks) keep working.
pub async fn ensure_connection(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(err) = state.connection.ensure().await {
        tracing::warn!(
            error = %err,
            path = %request.uri().path(),
            "Continuing without database connection"
        );
    }
    next.run(request).await
}

/// Fallback for unmatched routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": "Route not found" })),
    )
}

/// Render any pending [`ErrorReport`] into the JSON error body.
///
/// The report is removed while rendering, so a response that was already
/// formatted (or never carried an error) passes through untouched.
pub async fn format_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => report.render(state.production),
        None => response,
    }
}

/// Per-request panic boundary: the panic becomes a 500 for this request only.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());

    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::internal("Internal server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        map
    }

    #[test]
    fn json_content_types() {
        assert!(is_json(&headers("application/json")));
        assert!(is_json(&headers("application/json; charset=utf-8")));
        assert!(is_json(&headers("application/merge-patch+json")));
        assert!(!is_json(&headers("text/plain")));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn only_length_limit_counts_as_too_large() {
        let err = to_bytes(Body::from(vec![b'a'; 16]), 8).await.unwrap_err();
        assert!(exceeded_limit(&err));

        let stream = futures::stream::iter(vec![Err::<axum::body::Bytes, _>(
            std::io::Error::other("connection reset"),
        )]);
        let err = to_bytes(Body::from_stream(stream), 8).await.unwrap_err();
        assert!(!exceeded_limit(&err));
    }

    #[test]
    fn panic_payload_is_reported() {
        let response = panic_response(Box::new("handler exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "Internal server error");
    }
}
