//! Injected Host - In-Process Provider Slot
//!
//! Stands in for the page-global object a wallet extension injects
//! itself into. The provider can be injected (or removed) at any time;
//! `mark_loaded` plays the "document fully loaded" transition that
//! triggers re-detection.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::ports::host::ProviderHost;
use crate::ports::wallet_provider::WalletProvider;

/// Host environment with a mutable provider slot.
pub struct InjectedHost {
    slot: RwLock<Option<Arc<dyn WalletProvider>>>,
    loaded: watch::Sender<bool>,
}

impl InjectedHost {
    /// Host with no provider, not yet loaded.
    pub fn empty() -> Self {
        let (loaded, _) = watch::channel(false);
        Self {
            slot: RwLock::new(None),
            loaded,
        }
    }

    /// Host that already carries `provider` and has finished loading.
    pub fn with_provider(provider: Arc<dyn WalletProvider>) -> Self {
        let host = Self::empty();
        host.inject(provider);
        host.mark_loaded();
        host
    }

    /// Place a provider into the slot.
    pub fn inject(&self, provider: Arc<dyn WalletProvider>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(provider);
        info!("Wallet provider injected into host");
    }

    /// Empty the slot (extension removed or disabled).
    pub fn remove(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Signal that the host finished loading.
    pub fn mark_loaded(&self) {
        self.loaded.send_replace(true);
    }

    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }
}

impl Default for InjectedHost {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl ProviderHost for InjectedHost {
    fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn loaded(&self) {
        let mut rx = self.loaded.subscribe();
        let _ = rx.wait_for(|loaded| *loaded).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::provider::InMemoryProvider;

    #[test]
    fn test_slot_lifecycle() {
        let host = InjectedHost::empty();
        assert!(host.provider().is_none());
        assert!(!host.is_loaded());

        host.inject(Arc::new(InMemoryProvider::demo()));
        assert!(host.provider().is_some());

        host.remove();
        assert!(host.provider().is_none());
    }

    #[tokio::test]
    async fn test_loaded_resolves_after_mark() {
        let host = Arc::new(InjectedHost::empty());
        let waiter = {
            let host = Arc::clone(&host);
            tokio::spawn(async move { host.loaded().await })
        };

        host.mark_loaded();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("loaded() should resolve")
            .unwrap();
        assert!(host.is_loaded());
    }
}
