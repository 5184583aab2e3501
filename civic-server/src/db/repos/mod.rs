//! Repository implementations for database access

pub mod issues;

pub use issues::{DbError, IssueStore, PgIssueRepo};
