//! Router setup and server startup

use axum::routing::{get, post};
use axum::Router;
use daybook_domain::{DaybookConfig, DaybookError, Result as DomainResult};
use tokio::net::TcpListener;
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/messages", post(handlers::post_message))
        .route("/webhooks/telnyx", post(handlers::telnyx_webhook))
        .with_state(state)
}

/// Start the HTTP server on the configured address
///
/// Serves until ctrl-c, then drains in-flight requests.
pub async fn start_server(config: &DaybookConfig, state: AppState) -> DomainResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    info!(%addr, "starting http server");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| DaybookError::Network(format!("failed to bind {addr}: {err}")))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| DaybookError::Network(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
