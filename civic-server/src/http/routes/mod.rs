//! Route collaborators, merged into the dispatch table by `server::build_router`

pub mod health;
pub mod issues;
