//! Shared fixtures for pipeline integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use civic_server::db::{ConnectionCache, ConnectionError, Connector, DbError, IssueStore};
use civic_server::http::cors::AllowedOrigins;
use civic_server::models::{Issue, IssueStatus, NewIssue, Paginated, Pagination};
use civic_server::pdf::{IssueRenderer, PlainPdfRenderer};
use civic_server::{build_router, AppState};

pub const FRONTEND: &str = "http://localhost:3000";

/// Connector that counts attempts and fails while `failing` is set.
pub struct FakeConnector {
    pub calls: Arc<AtomicUsize>,
    pub failing: bool,
    pub delay: Duration,
}

#[async_trait]
impl Connector for FakeConnector {
    type Handle = ();

    async fn connect(&self) -> Result<(), ConnectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.failing {
            Err(ConnectionError::Connect("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

/// In-memory issue store; `unavailable` mimics a missing connection.
#[derive(Default)]
pub struct MemoryIssueStore {
    pub issues: Mutex<Vec<Issue>>,
    pub unavailable: bool,
}

impl MemoryIssueStore {
    pub fn with_issue(issue: Issue) -> Self {
        Self {
            issues: Mutex::new(vec![issue]),
            unavailable: false,
        }
    }

    fn check(&self) -> Result<(), DbError> {
        if self.unavailable {
            Err(DbError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IssueStore for MemoryIssueStore {
    async fn list(&self, page: Pagination) -> Result<Paginated<Issue>, DbError> {
        self.check()?;
        let issues = self.issues.lock().unwrap();
        let items: Vec<Issue> = issues
            .iter()
            .rev()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(Paginated {
            items,
            total: issues.len() as i64,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn create(&self, issue: NewIssue) -> Result<Issue, DbError> {
        self.check()?;
        let issue = Issue {
            id: Uuid::new_v4(),
            title: issue.title,
            description: issue.description,
            category: issue.category,
            location: issue.location,
            status: IssueStatus::Open,
            created_at: Utc::now(),
        };
        self.issues.lock().unwrap().push(issue.clone());
        Ok(issue)
    }

    async fn find(&self, id: &str) -> Result<Option<Issue>, DbError> {
        self.check()?;
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id.to_string() == id)
            .cloned())
    }
}

pub fn sample_issue() -> Issue {
    Issue {
        id: Uuid::new_v4(),
        title: "Broken streetlight".into(),
        description: "The light at Elm and 3rd has been out for a week.".into(),
        category: Some("lighting".into()),
        location: Some("Elm St & 3rd Ave".into()),
        status: IssueStatus::Open,
        created_at: Utc::now(),
    }
}

/// Builder for an app wired to fakes.
pub struct TestApp {
    pub connector_calls: Arc<AtomicUsize>,
    pub db_failing: bool,
    pub connect_delay: Duration,
    pub store: Arc<MemoryIssueStore>,
    pub renderer: Arc<dyn IssueRenderer>,
    pub production: bool,
    pub extra: Router<AppState>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self {
            connector_calls: Arc::new(AtomicUsize::new(0)),
            db_failing: false,
            connect_delay: Duration::from_millis(0),
            store: Arc::new(MemoryIssueStore::default()),
            renderer: Arc::new(PlainPdfRenderer),
            production: false,
            extra: Router::new(),
        }
    }
}

impl TestApp {
    pub fn state(&self) -> AppState {
        let connector = FakeConnector {
            calls: Arc::clone(&self.connector_calls),
            failing: self.db_failing,
            delay: self.connect_delay,
        };
        AppState {
            connection: Arc::new(ConnectionCache::new(connector)),
            issues: self.store.clone(),
            renderer: Arc::clone(&self.renderer),
            origins: AllowedOrigins::new([FRONTEND]),
            production: self.production,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state(), self.extra.clone())
    }

    pub fn attempts(&self) -> usize {
        self.connector_calls.load(Ordering::SeqCst)
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
