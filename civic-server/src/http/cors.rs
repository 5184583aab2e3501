//! CORS allow-list
//!
//! Rejection is silent: a disallowed origin still reaches the routes, it just
//! gets no `Access-Control-Allow-*` headers and the browser blocks the
//! response. Preflights from any origin are answered with 200.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Outcome of checking a request origin against the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsDecision {
    Allow,
    Reject,
}

/// Ordered, de-duplicated set of allowed origins. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOrigins {
    origins: Arc<[String]>,
}

impl AllowedOrigins {
    /// Build the set, keeping first-seen order and dropping duplicates.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for origin in origins {
            let origin = origin.into();
            if !origin.is_empty() && !unique.contains(&origin) {
                unique.push(origin);
            }
        }
        Self {
            origins: unique.into(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.origins
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    /// Decide for a request's `Origin` header.
    ///
    /// Absent origin (curl, mobile apps, server-to-server) is allowed.
    pub fn evaluate(&self, origin: Option<&str>) -> CorsDecision {
        match origin {
            None => CorsDecision::Allow,
            Some(origin) if self.contains(origin) => CorsDecision::Allow,
            Some(origin) => {
                tracing::warn!(origin, "CORS blocked origin");
                CorsDecision::Reject
            }
        }
    }

    /// Header-level variant of [`evaluate`](Self::evaluate); non-UTF-8 origins are rejected.
    pub fn evaluate_header(&self, origin: Option<&HeaderValue>) -> CorsDecision {
        match origin.map(HeaderValue::to_str) {
            None => self.evaluate(None),
            Some(Ok(origin)) => self.evaluate(Some(origin)),
            Some(Err(_)) => {
                tracing::warn!("CORS blocked non-UTF-8 origin");
                CorsDecision::Reject
            }
        }
    }
}

/// Build the CORS stage of the pipeline.
pub fn layer(origins: &AllowedOrigins) -> CorsLayer {
    let origins = origins.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _parts| {
            origins.evaluate_header(Some(origin)) == CorsDecision::Allow
        }))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
