//! Ultra Wallet Adapter — Demo Host
//!
//! Mounts the wallet adapter against a simulated provider and serves
//! the live session over HTTP. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (path from WALLET_CONFIG) + validate
//! 2. Init tracing (JSON or pretty, RUST_LOG overrides level)
//! 3. Create the host and mount the adapter (provider not yet injected)
//! 4. Inject the simulated provider after a delay, then mark the host loaded
//! 5. Spawn metrics tracker and the session server
//! 6. Wait for SIGINT → unmount adapter → stop tasks

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use ultra_wallet_adapter::adapters::host::InjectedHost;
use ultra_wallet_adapter::adapters::metrics::{SessionMetrics, SessionServer};
use ultra_wallet_adapter::adapters::provider::InMemoryProvider;
use ultra_wallet_adapter::config::{self, AppConfig};
use ultra_wallet_adapter::usecases::WalletAdapter;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_config(&config::loader::config_path())
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured logging ────────────────────
    init_tracing(&config);

    info!(
        provider = %config.adapter.provider_name,
        version = env!("CARGO_PKG_VERSION"),
        trusted = config.simulation.trusted,
        "Starting wallet adapter demo host"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 3. Host + adapter ───────────────────────────────────
    let host = Arc::new(InjectedHost::empty());
    let adapter = WalletAdapter::mount(host.clone(), config.adapter.clone());

    // ── 4. Late provider injection ──────────────────────────
    let provider = Arc::new(InMemoryProvider::from_config(&config.simulation));
    let inject_delay = Duration::from_millis(config.simulation.inject_delay_ms);
    let inject_host = Arc::clone(&host);
    let inject_handle = tokio::spawn(async move {
        tokio::time::sleep(inject_delay).await;
        inject_host.inject(provider);
        inject_host.mark_loaded();
    });

    // ── 5. Metrics + session server ─────────────────────────
    let metrics = Arc::new(SessionMetrics::new().context("Failed to register metrics")?);
    let metrics_handle = tokio::spawn(
        Arc::clone(&metrics).track(adapter.subscribe(), shutdown_tx.subscribe()),
    );

    let server = SessionServer::new(
        Arc::clone(&adapter),
        Arc::clone(&metrics),
        config.server.bind_address.clone(),
    );
    let server_shutdown = shutdown_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run(server_shutdown).await {
            error!(error = %e, "Session server failed");
        }
    });

    info!("All tasks spawned — adapter is running");

    // ── 6. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, shutting down");

    adapter.unmount();
    let _ = shutdown_tx.send(());
    inject_handle.abort();

    let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(1), metrics_handle).await;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
