//! Postgres connector used by the connection cache
//!
//! Uses sqlx PgPool with fixed limits and timeouts. Schema migrations run as
//! part of the connection attempt, so they execute once per successful connect.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::cache::{ConnectionError, Connector};
use super::migrations;
use crate::config::ConfigError;

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// How long to wait for the server before failing a connect or acquire.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle sockets are closed after this long.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(45);

/// Pool limits supplied at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Opens a Postgres pool from a connection string.
#[derive(Debug, Clone)]
pub struct PgConnector {
    database_url: Option<String>,
    settings: PoolSettings,
}

impl PgConnector {
    pub fn new(database_url: Option<String>, settings: PoolSettings) -> Self {
        Self {
            database_url,
            settings,
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Handle = PgPool;

    async fn connect(&self) -> Result<PgPool, ConnectionError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(self.settings.connect_timeout)
            .idle_timeout(self.settings.idle_timeout)
            .connect(url)
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;

        migrations::run(&pool)
            .await
            .map_err(|e| ConnectionError::Connect(format!("migration failed: {}", e)))?;

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.idle_timeout, Duration::from_secs(45));
    }

    #[tokio::test]
    async fn missing_url_fails_before_io() {
        let connector = PgConnector::new(None, PoolSettings::default());
        let err = connector.connect().await.unwrap_err();
        assert_eq!(err, ConnectionError::Config(ConfigError::MissingDatabaseUrl));
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p civic-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgConnector::new(Some(url), PoolSettings::default())
            .connect()
            .await
            .expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }
}
