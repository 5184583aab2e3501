//! HTTP server layer
//!
//! Axum server with:
//! - CORS allow-list (silent rejection)
//! - JSON body parsing before dispatch
//! - Best-effort database connection per request
//! - Centralized JSON error responses
//! - Request tracing and graceful shutdown

pub mod cors;
pub mod error;
pub mod extractors;
pub mod pipeline;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, ServerError};
