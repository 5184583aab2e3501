//! Issue records and creation payloads

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{bounded_text, ValidationError};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;
const MAX_FIELD_LEN: usize = 200;

/// Lifecycle status of a reported issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(ValidationError::InvalidVariant {
                field: "status",
                value: other.to_owned(),
            }),
        }
    }
}

/// A stored issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/issues`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Validated input for inserting an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl TryFrom<CreateIssueRequest> for NewIssue {
    type Error = ValidationError;

    fn try_from(req: CreateIssueRequest) -> Result<Self, Self::Error> {
        let optional = |field: &'static str, value: Option<String>| -> Result<Option<String>, ValidationError> {
            match value.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(v) => bounded_text(field, v, MAX_FIELD_LEN).map(Some),
            }
        };

        Ok(Self {
            title: bounded_text("title", &req.title, MAX_TITLE_LEN)?,
            description: bounded_text("description", &req.description, MAX_DESCRIPTION_LEN)?,
            category: optional("category", req.category)?,
            location: optional("location", req.location)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, description: &str) -> CreateIssueRequest {
        CreateIssueRequest {
            title: title.into(),
            description: description.into(),
            category: None,
            location: None,
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [IssueStatus::Open, IssueStatus::InProgress, IssueStatus::Resolved] {
            assert_eq!(status.as_str().parse::<IssueStatus>().unwrap(), status);
        }
        assert!("closed".parse::<IssueStatus>().is_err());
    }

    #[test]
    fn new_issue_trims_and_drops_blank_optionals() {
        let mut req = request(" Broken streetlight ", "Dark since Monday");
        req.category = Some("  ".into());
        req.location = Some(" Main St ".into());

        let issue = NewIssue::try_from(req).unwrap();
        assert_eq!(issue.title, "Broken streetlight");
        assert_eq!(issue.category, None);
        assert_eq!(issue.location.as_deref(), Some("Main St"));
    }

    #[test]
    fn new_issue_rejects_empty_and_long_fields() {
        assert_eq!(
            NewIssue::try_from(request("", "x")).unwrap_err(),
            ValidationError::Empty { field: "title" }
        );
        let long = "a".repeat(MAX_TITLE_LEN + 1);
        assert_eq!(
            NewIssue::try_from(request(&long, "x")).unwrap_err(),
            ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN
            }
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
