//! civic-server: REST backend for a civic issue tracker
//!
//! The parts with real behavioral contracts live here:
//! - [`db::ConnectionCache`]: process-wide, single-flight database connection
//! - [`http::pipeline`]: CORS → body parsing → connection → dispatch → 404 → error formatting
//! - [`pdf::PdfResponder`]: issue PDF export with exact binary response headers
//! - [`fault`]: last-resort logging of unobserved failures

pub mod config;
pub mod db;
pub mod fault;
pub mod http;
pub mod models;
pub mod pdf;
pub mod state;
pub mod tracing_setup;

pub use config::{ConfigError, ServerConfig};
pub use http::{build_router, run_server, ApiError};
pub use state::AppState;
