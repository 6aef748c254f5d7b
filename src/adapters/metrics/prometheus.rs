//! Prometheus Session Metrics - Wallet Adapter Observability
//!
//! Derives gauges and counters from session transitions by watching
//! the adapter's session channel, so the usecase layer stays free of
//! metrics plumbing.

use std::sync::Arc;

use anyhow::Context;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use tokio::sync::{broadcast, watch};
use tracing::{debug, instrument};

use crate::domain::session::WalletSession;

/// Prometheus metrics for one wallet adapter.
///
/// All metrics follow the naming convention `wallet_adapter_*`.
pub struct SessionMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Provider presence (1 = installed).
    pub installed: IntGauge,
    /// Session status (1 = connected).
    pub connected: IntGauge,
    /// Provider call in flight (1 = loading).
    pub loading: IntGauge,
    /// Sessions established, by any path.
    pub connections: IntCounter,
    /// Sessions ended, by any path.
    pub disconnections: IntCounter,
    /// Errors surfaced to the UI.
    pub errors: IntCounter,
}

impl SessionMetrics {
    /// Create and register all metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let installed = IntGauge::new(
            "wallet_adapter_installed",
            "Wallet provider present (1=yes, 0=no)",
        )?;
        let connected = IntGauge::new(
            "wallet_adapter_connected",
            "Wallet session status (1=connected, 0=disconnected)",
        )?;
        let loading = IntGauge::new(
            "wallet_adapter_loading",
            "Provider call in flight (1=yes, 0=no)",
        )?;
        let connections = IntCounter::new(
            "wallet_adapter_connections_total",
            "Wallet sessions established",
        )?;
        let disconnections = IntCounter::new(
            "wallet_adapter_disconnections_total",
            "Wallet sessions ended",
        )?;
        let errors = IntCounter::new(
            "wallet_adapter_errors_total",
            "Errors surfaced by wallet operations",
        )?;

        registry.register(Box::new(installed.clone()))?;
        registry.register(Box::new(connected.clone()))?;
        registry.register(Box::new(loading.clone()))?;
        registry.register(Box::new(connections.clone()))?;
        registry.register(Box::new(disconnections.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Self {
            registry,
            installed,
            connected,
            loading,
            connections,
            disconnections,
            errors,
        })
    }

    /// Update metrics for a transition from `before` to `after`.
    pub fn observe(&self, before: &WalletSession, after: &WalletSession) {
        self.installed.set(i64::from(after.is_installed()));
        self.connected.set(i64::from(after.is_connected()));
        self.loading.set(i64::from(after.is_loading()));

        match (before.is_connected(), after.is_connected()) {
            (false, true) => self.connections.inc(),
            (true, false) => self.disconnections.inc(),
            _ => {}
        }

        if after.error().is_some() && after.error() != before.error() {
            self.errors.inc();
        }
    }

    /// Follow a session channel until shutdown.
    #[instrument(skip_all)]
    pub async fn track(
        self: Arc<Self>,
        mut session_rx: watch::Receiver<WalletSession>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut last = session_rx.borrow_and_update().clone();
        self.observe(&WalletSession::new(), &last);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = session_rx.borrow_and_update().clone();
                    self.observe(&last, &current);
                    last = current;
                }
            }
        }
        debug!("Session metrics tracker stopped");
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not UTF-8")
    }
}
