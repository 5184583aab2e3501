//! Application state shared across handlers and pipeline stages

use std::sync::Arc;

use crate::db::{ConnectionCache, EnsureConnection, IssueStore, PgConnector, PgIssueRepo};
use crate::http::cors::AllowedOrigins;
use crate::pdf::{IssueRenderer, PlainPdfRenderer};

/// Shared application state
///
/// Every collaborator sits behind a trait object so tests can swap in
/// in-memory stores and fake connectors.
#[derive(Clone)]
pub struct AppState {
    /// Connection cache consulted by the pipeline before dispatch
    pub connection: Arc<dyn EnsureConnection>,
    pub issues: Arc<dyn IssueStore>,
    pub renderer: Arc<dyn IssueRenderer>,
    pub origins: AllowedOrigins,
    /// Hide error details from response bodies
    pub production: bool,
}

impl AppState {
    /// Wire the Postgres-backed collaborators around one connection cache.
    pub fn postgres(
        cache: Arc<ConnectionCache<PgConnector>>,
        origins: AllowedOrigins,
        production: bool,
    ) -> Self {
        Self {
            issues: Arc::new(PgIssueRepo::new(Arc::clone(&cache))),
            connection: cache,
            renderer: Arc::new(PlainPdfRenderer),
            origins,
            production,
        }
    }
}
