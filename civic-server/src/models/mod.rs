//! Domain models with validation at construction
//!
//! Request payloads are validated when converted into these types.
//! Invalid input returns ValidationError, not panic.

pub mod issue;
pub mod pagination;
pub mod validation;

pub use issue::{CreateIssueRequest, Issue, IssueStatus, NewIssue};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use validation::ValidationError;
