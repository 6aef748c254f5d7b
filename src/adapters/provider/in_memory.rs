//! In-Memory Provider - Simulated Wallet Extension
//!
//! Implements the `WalletProvider` port without a browser. Models the
//! parts of a real wallet the adapter depends on: a remembered trust
//! relationship with the origin, user approval of prompts, and
//! `connect`/`disconnect` event emission. Failure knobs allow driving
//! every adapter error path.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::domain::error::ProviderError;
use crate::domain::session::WalletAccount;
use crate::domain::transaction::{SignOptions, TransactionRequest};
use crate::ports::wallet_provider::{
    ConnectOptions, ProviderEvent, ProviderResponse, WalletProvider,
};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct ProviderState {
    trusted: bool,
    connected: bool,
    auto_approve: bool,
    disconnect_error: Option<ProviderError>,
    chain_id_error: Option<ProviderError>,
    signed_messages: Vec<String>,
    connect_calls: usize,
}

/// Simulated wallet provider.
pub struct InMemoryProvider {
    account: WalletAccount,
    chain_id: String,
    state: Mutex<ProviderState>,
    events: broadcast::Sender<ProviderEvent>,
}

impl InMemoryProvider {
    /// Untrusted provider that approves prompts.
    pub fn new(account: WalletAccount, chain_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            account,
            chain_id: chain_id.into(),
            state: Mutex::new(ProviderState {
                auto_approve: true,
                ..Default::default()
            }),
            events,
        }
    }

    /// Provider configured from the `[simulation]` section.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let provider = Self::new(
            WalletAccount::new(config.account.clone(), config.public_key.clone()),
            config.chain_id.clone(),
        );
        provider.set_trusted(config.trusted);
        provider.set_auto_approve(config.auto_approve);
        provider
    }

    /// Provider with the default demo identity.
    pub fn demo() -> Self {
        Self::from_config(&SimulationConfig::default())
    }

    pub fn account(&self) -> &WalletAccount {
        &self.account
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the origin is remembered as trusted.
    pub fn set_trusted(&self, trusted: bool) {
        self.lock().trusted = trusted;
    }

    pub fn is_trusted(&self) -> bool {
        self.lock().trusted
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Whether prompts (interactive connect, signing) are approved.
    pub fn set_auto_approve(&self, approve: bool) {
        self.lock().auto_approve = approve;
    }

    /// Make `disconnect` fail with `error` until cleared.
    pub fn set_disconnect_error(&self, error: Option<ProviderError>) {
        self.lock().disconnect_error = error;
    }

    /// Make `get_chain_id` fail with `error` until cleared.
    pub fn set_chain_id_error(&self, error: Option<ProviderError>) {
        self.lock().chain_id_error = error;
    }

    /// Messages received by `sign_message`, as forwarded.
    pub fn signed_messages(&self) -> Vec<String> {
        self.lock().signed_messages.clone()
    }

    /// Number of `connect` calls seen, silent ones included.
    pub fn connect_calls(&self) -> usize {
        self.lock().connect_calls
    }

    /// The user disconnects from the wallet's own UI.
    pub fn revoke_externally(&self) {
        {
            let mut state = self.lock();
            state.trusted = false;
            state.connected = false;
        }
        let _ = self.events.send(ProviderEvent::Disconnect);
    }

    /// The user connects from the wallet's own UI.
    pub fn approve_externally(&self) {
        {
            let mut state = self.lock();
            state.trusted = true;
            state.connected = true;
        }
        let _ = self.events.send(ProviderEvent::Connect(self.account.clone()));
    }

    fn require_connected(&self) -> Result<(), ProviderError> {
        let state = self.lock();
        if !state.connected {
            return Err(ProviderError::new("Wallet is not connected to this site"));
        }
        if !state.auto_approve {
            return Err(ProviderError::user_rejected());
        }
        Ok(())
    }

    fn success(data: serde_json::Value) -> ProviderResponse {
        ProviderResponse {
            status: Some("success".to_string()),
            data,
        }
    }
}

#[async_trait]
impl WalletProvider for InMemoryProvider {
    async fn connect(&self, options: ConnectOptions) -> Result<WalletAccount, ProviderError> {
        let newly_connected = {
            let mut state = self.lock();
            state.connect_calls += 1;

            let allowed = state.trusted || (!options.only_if_trusted && state.auto_approve);
            if !allowed {
                return Err(ProviderError::user_rejected());
            }

            state.trusted = true;
            !std::mem::replace(&mut state.connected, true)
        };

        if newly_connected {
            let _ = self.events.send(ProviderEvent::Connect(self.account.clone()));
        }
        Ok(self.account.clone())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        {
            let mut state = self.lock();
            if let Some(error) = state.disconnect_error.clone() {
                return Err(error);
            }
            state.trusted = false;
            state.connected = false;
        }
        let _ = self.events.send(ProviderEvent::Disconnect);
        Ok(())
    }

    async fn get_chain_id(&self) -> Result<String, ProviderError> {
        match self.lock().chain_id_error.clone() {
            Some(error) => Err(error),
            None => Ok(self.chain_id.clone()),
        }
    }

    async fn sign_transaction(
        &self,
        request: &TransactionRequest,
        options: Option<SignOptions>,
    ) -> Result<ProviderResponse, ProviderError> {
        self.require_connected()?;

        let sign_only = options.and_then(|o| o.sign_only).unwrap_or(false);
        debug!(actions = request.len(), sign_only, "Simulated transaction signed");

        Ok(Self::success(json!({
            "transactionHash": Uuid::new_v4().simple().to_string(),
            "actions": request.len(),
            "signOnly": sign_only,
        })))
    }

    async fn sign_message(&self, message: &str) -> Result<ProviderResponse, ProviderError> {
        self.require_connected()?;
        self.lock().signed_messages.push(message.to_string());

        Ok(Self::success(json!({
            "message": message,
            "signature": format!("SIG_K1_{}", Uuid::new_v4().simple()),
        })))
    }

    async fn purchase_item(
        &self,
        item_type: &str,
        item_id: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        self.require_connected()?;

        Ok(Self::success(json!({
            "transactionHash": Uuid::new_v4().simple().to_string(),
            "itemType": item_type,
            "itemId": item_id,
        })))
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        Some(self.events.subscribe())
    }
}
