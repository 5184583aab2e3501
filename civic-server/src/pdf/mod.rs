//! On-demand PDF export of a single issue
//!
//! [`PdfResponder`] loads the issue, hands it to an [`IssueRenderer`] and
//! wraps the bytes in a [`PdfResponse`] whose headers are fixed before the
//! body is written. The body is a single in-memory buffer, so the response
//! carries an exact `Content-Length` and is never chunked.

pub mod render;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::db::repos::{DbError, IssueStore};
use crate::models::Issue;

pub use render::PlainPdfRenderer;

/// Renderer failure
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to format document: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("render failed: {0}")]
    Failed(String),
}

/// Turns an issue into PDF bytes. Must not perform I/O.
pub trait IssueRenderer: Send + Sync {
    fn render(&self, issue: &Issue) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Issue not found")]
    NotFound { id: String },

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A rendered document ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfResponse {
    filename: String,
    bytes: Vec<u8>,
}

impl PdfResponse {
    /// `issue_<id>.pdf`; characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn new(entity_id: &str, bytes: Vec<u8>) -> Self {
        let safe_id: String = entity_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self {
            filename: format!("issue_{}.pdf", safe_id),
            bytes,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

impl IntoResponse for PdfResponse {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        let length = self.bytes.len();

        let mut response = Response::new(Body::from(self.bytes));
        *response.status_mut() = StatusCode::OK;

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/pdf"),
        );
        // filename is sanitized to ASCII, so this cannot fail
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

        response
    }
}

/// Loads an issue and renders it.
pub struct PdfResponder<'a> {
    store: &'a dyn IssueStore,
    renderer: &'a dyn IssueRenderer,
}

impl<'a> PdfResponder<'a> {
    pub fn new(store: &'a dyn IssueStore, renderer: &'a dyn IssueRenderer) -> Self {
        Self { store, renderer }
    }

    pub async fn generate(&self, entity_id: &str) -> Result<PdfResponse, PdfError> {
        let issue = self
            .store
            .find(entity_id)
            .await?
            .ok_or_else(|| PdfError::NotFound {
                id: entity_id.to_owned(),
            })?;

        let bytes = self.renderer.render(&issue)?;
        tracing::debug!(issue_id = entity_id, bytes = bytes.len(), "Rendered issue PDF");

        Ok(PdfResponse::new(entity_id, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn filename_uses_entity_id() {
        let pdf = PdfResponse::new("65f0c1d2e3", vec![1, 2, 3]);
        assert_eq!(pdf.filename(), "issue_65f0c1d2e3.pdf");
        assert_eq!(
            pdf.content_disposition(),
            "attachment; filename=\"issue_65f0c1d2e3.pdf\""
        );
    }

    #[test]
    fn filename_is_sanitized() {
        let pdf = PdfResponse::new("a\"b\r\nc", Vec::new());
        assert_eq!(pdf.filename(), "issue_a_b__c.pdf");
    }

    #[tokio::test]
    async fn response_headers_match_buffer() {
        let bytes = b"%PDF-1.4 fake".to_vec();
        let response = PdfResponse::new("abc", bytes.clone()).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"issue_abc.pdf\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], bytes.len().to_string().as_str());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), bytes.as_slice());
    }
}
