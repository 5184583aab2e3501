//! Issue repository
//!
//! Data-access collaborator for the issue routes and the PDF export. The
//! Postgres implementation reads the pool from the connection cache and never
//! connects on its own: with no cached connection it reports `Unavailable`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::cache::ConnectionCache;
use crate::db::pool::PgConnector;
use crate::models::{Issue, IssueStatus, NewIssue, Paginated, Pagination};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// No established connection; the pipeline's connect stage failed
    #[error("database unavailable")]
    Unavailable,

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Issue storage operations
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Newest first.
    async fn list(&self, page: Pagination) -> Result<Paginated<Issue>, DbError>;

    async fn create(&self, issue: NewIssue) -> Result<Issue, DbError>;

    /// Look up by opaque id. Ids that cannot exist (not a UUID) yield `None`.
    async fn find(&self, id: &str) -> Result<Option<Issue>, DbError>;
}

/// Postgres-backed issue store
pub struct PgIssueRepo {
    cache: Arc<ConnectionCache<PgConnector>>,
}

impl PgIssueRepo {
    pub fn new(cache: Arc<ConnectionCache<PgConnector>>) -> Self {
        Self { cache }
    }

    fn pool(&self) -> Result<PgPool, DbError> {
        self.cache.current().ok_or(DbError::Unavailable)
    }
}

fn issue_from_row(row: &sqlx::postgres::PgRow) -> Result<Issue, DbError> {
    let status: String = row.try_get("status")?;
    Ok(Issue {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        location: row.try_get("location")?,
        status: status
            .parse::<IssueStatus>()
            .map_err(|e| DbError::Corrupt(e.to_string()))?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl IssueStore for PgIssueRepo {
    async fn list(&self, page: Pagination) -> Result<Paginated<Issue>, DbError> {
        let pool = self.pool()?;

        // Single query with COUNT(*) OVER() for total
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, category, location, status, created_at,
                   COUNT(*) OVER() AS total
            FROM issues
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&pool)
        .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None => 0,
        };
        let items = rows
            .iter()
            .map(issue_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn create(&self, issue: NewIssue) -> Result<Issue, DbError> {
        let pool = self.pool()?;

        let row = sqlx::query(
            r#"
            INSERT INTO issues (title, description, category, location)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, category, location, status, created_at
            "#,
        )
        .bind(&issue.title)
        .bind(&issue.description)
        .bind(&issue.category)
        .bind(&issue.location)
        .fetch_one(&pool)
        .await?;

        issue_from_row(&row)
    }

    async fn find(&self, id: &str) -> Result<Option<Issue>, DbError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let pool = self.pool()?;

        let row = sqlx::query(
            r#"
            SELECT id, title, description, category, location, status, created_at
            FROM issues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await?;

        row.as_ref().map(issue_from_row).transpose()
    }
}
