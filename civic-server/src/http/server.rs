//! Axum server setup
//!
//! Server skeleton with:
//! - The fixed request pipeline (see [`super::pipeline`])
//! - Allow-list CORS with silent rejection
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::{cors, pipeline, routes};
use crate::state::AppState;

/// Build the application router with the full pipeline.
///
/// `extra` holds additional route collaborators (other `/api/*` resources);
/// they are dispatched after the built-in routes and before the 404 fallback.
pub fn build_router(state: AppState, extra: Router<AppState>) -> Router {
    let cors = cors::layer(&state.origins);

    // Layers wrap outward: the last one added runs first.
    Router::new()
        .merge(routes::health::router())
        .merge(routes::issues::router())
        .merge(extra)
        .fallback(pipeline::not_found)
        // a known path with the wrong method is still "no route"
        .method_not_allowed_fallback(pipeline::not_found)
        .layer(CatchPanicLayer::custom(pipeline::panic_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            pipeline::ensure_connection,
        ))
        .layer(middleware::from_fn(pipeline::parse_json_body))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            pipeline::format_errors,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run_server(state: AppState, bind_addr: SocketAddr) -> Result<(), ServerError> {
    let app = build_router(state, Router::new());

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
