//! Process-wide connection cache
//!
//! Holds the established database handle plus at most one in-flight
//! connection attempt. Concurrent callers that arrive while an attempt is
//! running join that attempt instead of starting their own, so a burst of
//! cold-start requests produces exactly one physical connect.
//!
//! The presence-check and the store of a new attempt happen under a
//! synchronous lock that is never held across an `.await`.
//!
//! Failures are never cached: the attempt is cleared and the next caller
//! starts over.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::config::ConfigError;

/// Connection failure, shared by every caller of the same attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Missing connection string; raised before any I/O
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Connect(String),
}

/// Something that can open a database handle.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    /// Perform one physical connection attempt.
    async fn connect(&self) -> Result<Self::Handle, ConnectionError>;
}

/// Object-safe view of the cache used by the pipeline's connection stage.
#[async_trait]
pub trait EnsureConnection: Send + Sync {
    async fn ensure(&self) -> Result<(), ConnectionError>;
}

type Attempt<H> = Shared<BoxFuture<'static, Result<H, ConnectionError>>>;

struct ConnectionState<H> {
    connection: Option<H>,
    pending: Option<(u64, Attempt<H>)>,
    attempts: u64,
}

/// Memoized connection handle with single-flight connection attempts.
pub struct ConnectionCache<C: Connector> {
    connector: Arc<C>,
    state: Mutex<ConnectionState<C::Handle>>,
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            state: Mutex::new(ConnectionState {
                connection: None,
                pending: None,
                attempts: 0,
            }),
        }
    }

    /// Return the cached handle, joining or starting a connection attempt if needed.
    pub async fn ensure_connection(&self) -> Result<C::Handle, ConnectionError> {
        let (id, attempt) = {
            let mut state = self.lock();

            if let Some(connection) = &state.connection {
                return Ok(connection.clone());
            }

            match &state.pending {
                Some((id, attempt)) => (*id, attempt.clone()),
                None => {
                    state.attempts += 1;
                    let id = state.attempts;
                    let connector = Arc::clone(&self.connector);
                    let attempt = async move { connector.connect().await }.boxed().shared();
                    state.pending = Some((id, attempt.clone()));
                    tracing::debug!(attempt = id, "Starting database connection attempt");
                    (id, attempt)
                }
            }
        };

        let outcome = attempt.await;

        // First caller to observe the outcome settles the state and logs;
        // later joiners of the same attempt find it already cleared.
        let mut state = self.lock();
        if matches!(&state.pending, Some((pending, _)) if *pending == id) {
            state.pending = None;
            match &outcome {
                Ok(handle) => {
                    state.connection = Some(handle.clone());
                    tracing::info!(attempt = id, "Database connected");
                }
                Err(err) => {
                    tracing::error!(attempt = id, error = %err, "Database connection failed");
                }
            }
        }

        outcome
    }

    /// The established handle, without any I/O.
    pub fn current(&self) -> Option<C::Handle> {
        self.lock().connection.clone()
    }

    /// Whether an attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Number of physical connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.lock().attempts
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState<C::Handle>> {
        // State stays consistent even if a holder panicked; nothing awaits under the lock.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<C: Connector> EnsureConnection for ConnectionCache<C> {
    async fn ensure(&self) -> Result<(), ConnectionError> {
        self.ensure_connection().await.map(|_| ())
    }
}
