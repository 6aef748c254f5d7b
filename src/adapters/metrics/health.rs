//! Session Server - Health, Session and Metrics Endpoints
//!
//! Exposes the adapter to out-of-process consumers via axum 0.7:
//! - `/live`    — 200 while the process runs
//! - `/ready`   — 200 once a wallet provider is installed
//! - `/session` — current session as JSON
//! - `/metrics` — Prometheus text format

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use super::prometheus::SessionMetrics;
use crate::usecases::WalletAdapter;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
struct ServerState {
    adapter: Arc<WalletAdapter>,
    metrics: Arc<SessionMetrics>,
}

/// Axum-based session HTTP server.
pub struct SessionServer {
    state: ServerState,
    bind_address: String,
}

impl SessionServer {
    pub fn new(
        adapter: Arc<WalletAdapter>,
        metrics: Arc<SessionMetrics>,
        bind_address: impl Into<String>,
    ) -> Self {
        Self {
            state: ServerState { adapter, metrics },
            bind_address: bind_address.into(),
        }
    }

    /// Build the router.
    fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/session", get(Self::session))
            .route("/metrics", get(Self::metrics))
            .with_state(self.state.clone())
    }

    /// Serve until the shutdown signal fires.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!(address = %self.bind_address, "Session server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    async fn readiness(State(state): State<ServerState>) -> impl IntoResponse {
        if state.adapter.is_installed() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NO PROVIDER")
        }
    }

    async fn session(State(state): State<ServerState>) -> impl IntoResponse {
        Json(state.adapter.view())
    }

    async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
        match state.metrics.encode() {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => {
                warn!(error = %e, "Failed to render metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            }
        }
    }
}
