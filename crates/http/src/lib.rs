//! In-memory stand-in for the remote book service.
//!
//! Serves the same `/api/auth/login` and `/api/books` contract the client
//! consumes, for local development and for tests.

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use tokio::net::TcpListener;

use bookclub_kernel::settings::StubSettings;

pub mod error;
pub mod router;
pub mod routes;
pub mod store;

use router::RouterBuilder;
pub use store::{StoredBook, StubState};

const DEFAULT_TIMEOUT_MS: u64 = 15000;

/// Bind to the configured address and serve a seeded stub until shutdown.
pub async fn start_server(settings: &StubSettings) -> anyhow::Result<()> {
    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {}", address))?;

    let state = StubState::new(&settings.admin_username, &settings.admin_password)
        .with_sample_catalog();

    tracing::info!("stub book service listening on http://{}", address);

    let app = build_router(Arc::new(state), settings.request_timeout_ms);
    axum::serve(listener, app)
        .await
        .context("stub book service failed")?;

    Ok(())
}

/// Serve `state` on an already bound listener.
pub async fn serve(listener: TcpListener, state: Arc<StubState>) -> anyhow::Result<()> {
    let app = build_router(state, DEFAULT_TIMEOUT_MS);
    axum::serve(listener, app)
        .await
        .context("stub book service failed")?;
    Ok(())
}

/// Build the full router with middleware.
pub fn build_router(state: Arc<StubState>, request_timeout_ms: u64) -> Router {
    RouterBuilder::new()
        .route("/healthz", get(health_check))
        .mount_api(routes::api_routes(state))
        .with_timeout(request_timeout_ms)
        .with_request_id()
        .with_cors()
        .with_tracing()
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
