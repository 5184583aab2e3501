//! API error types and the centralized error formatter
//!
//! Handlers and pipeline stages never write error bodies themselves.
//! Converting an [`ApiError`] into a response only sets the status and
//! attaches an [`ErrorReport`] extension; the `format_errors` stage turns that
//! report into the JSON body exactly once:
//!
//! ```json
//! {"status": "error", "message": "...", "stack": "..."}
//! ```
//!
//! `stack` (the error's debug chain) is omitted in production.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::repos::DbError;
use crate::models::ValidationError;
use crate::pdf::{PdfError, RenderError};

/// API error type with automatic HTTP status mapping
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or unreadable request body (400)
    #[error("{0}")]
    BadRequest(String),

    /// Body exceeded the size limit (413)
    #[error("request body too large")]
    PayloadTooLarge,

    /// Validation failed (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Resource not found (404)
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// No database connection (503)
    #[error("Database unavailable")]
    Unavailable,

    /// Query failed (500)
    #[error("database error")]
    Database(#[source] DbError),

    /// PDF generation failed (500)
    #[error("failed to generate PDF")]
    Render(#[from] RenderError),

    /// Handler panicked or other internal failure (500)
    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Render(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Unavailable => Self::Unavailable,
            other => Self::Database(other),
        }
    }
}

impl From<PdfError> for ApiError {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::NotFound { id } => Self::NotFound {
                resource: "issue",
                id,
            },
            PdfError::Database(e) => e.into(),
            PdfError::Render(e) => Self::Render(e),
        }
    }
}

/// Unformatted error carried on a response until the formatter stage renders it.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    /// Debug rendering of the error and its sources
    pub stack: String,
}

impl ErrorReport {
    pub fn from_error(err: &ApiError) -> Self {
        let mut stack = format!("{:?}", err);
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            stack.push_str("\n  caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            status: err.status(),
            message: err.to_string(),
            stack,
        }
    }

    /// Render the JSON error body. Logs server-side failures with full detail.
    pub fn render(self, production: bool) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.stack, "Request failed");
        } else {
            tracing::debug!(status = self.status.as_u16(), message = %self.message, "Request rejected");
        }

        let body = if production {
            json!({ "status": "error", "message": self.message })
        } else {
            json!({ "status": "error", "message": self.message, "stack": self.stack })
        };

        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from_error(&self);
        let mut response = report.status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}
