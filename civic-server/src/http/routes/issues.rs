//! Issue endpoints, including the PDF export

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, ValidQuery};
use crate::models::{CreateIssueRequest, Issue, NewIssue, Paginated, Pagination, PaginationParams};
use crate::pdf::{PdfError, PdfResponder};
use crate::state::AppState;

/// GET /api/issues - newest first, paginated
async fn list_issues(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> Result<Json<Paginated<Issue>>, ApiError> {
    let page = Pagination::from(params);
    let issues = state.issues.list(page).await?;
    Ok(Json(issues))
}

/// POST /api/issues - report a new issue
async fn create_issue(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateIssueRequest>,
) -> Result<(StatusCode, Json<Issue>), ApiError> {
    let new_issue = NewIssue::try_from(req)?;
    let issue = state.issues.create(new_issue).await?;
    tracing::info!(issue_id = %issue.id, "Issue reported");
    Ok((StatusCode::CREATED, Json(issue)))
}

/// GET /api/issues/{id}
async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
    state
        .issues
        .find(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound {
            resource: "issue",
            id,
        })
}

/// GET /api/issues/{id}/pdf - download the issue as a PDF attachment
async fn issue_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let responder = PdfResponder::new(state.issues.as_ref(), state.renderer.as_ref());
    match responder.generate(&id).await {
        Ok(pdf) => Ok(pdf.into_response()),
        Err(PdfError::NotFound { .. }) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Issue not found" })),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Issue routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/issues", get(list_issues).post(create_issue))
        .route("/api/issues/{id}", get(get_issue))
        .route("/api/issues/{id}/pdf", get(issue_pdf))
}
