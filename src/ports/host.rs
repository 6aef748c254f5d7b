//! Provider Host Port - Provider Detection Interface
//!
//! Abstracts the environment the provider is injected into. Wallet
//! extensions may inject themselves after initial script evaluation,
//! so detection is re-run once the host reports it has fully loaded.

use std::sync::Arc;

use async_trait::async_trait;

use super::wallet_provider::WalletProvider;

/// Trait for environments that may carry an injected provider.
#[async_trait]
pub trait ProviderHost: Send + Sync + 'static {
  /// The injected provider, if present right now.
  fn provider(&self) -> Option<Arc<dyn WalletProvider>>;

  /// Resolve once the host has fully loaded. Resolves immediately if
  /// it already has.
  async fn loaded(&self);
}
