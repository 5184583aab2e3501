//! Database layer - connection cache, connector and repositories
//!
//! # Design Principles
//!
//! - One process-wide [`ConnectionCache`]; requests never open their own connections
//! - Concurrent cold starts collapse onto a single connection attempt
//! - Failed attempts are forgotten so the next request retries
//! - Repositories read the cached pool and report `Unavailable` instead of connecting

pub mod cache;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use cache::{ConnectionCache, ConnectionError, Connector, EnsureConnection};
pub use pool::{PgConnector, PoolSettings};
pub use repos::*;
