//! Wallet Provider Port - Injected Wallet Capability Interface
//!
//! Mirrors the capability object a browser wallet injects into the
//! host page: connect/disconnect, chain id lookup, signing, marketplace
//! purchases, and an optional `connect`/`disconnect` event stream.
//! The adapter receives it by injection instead of a global lookup, so
//! tests can substitute a fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::error::ProviderError;
use crate::domain::session::WalletAccount;
use crate::domain::transaction::{SignOptions, TransactionRequest};

/// Options for `connect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
  /// Never prompt; fail unless the origin is already trusted.
  #[serde(default)]
  pub only_if_trusted: bool,
}

impl ConnectOptions {
  /// Silent connect used by eager connect and the liveness probe.
  pub fn trusted_only() -> Self {
    Self {
      only_if_trusted: true,
    }
  }
}

/// Response wrapper returned by signing and purchase calls.
///
/// Handed back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
  /// Provider status string (e.g. `success`).
  #[serde(default)]
  pub status: Option<String>,
  /// Call-specific payload.
  #[serde(default)]
  pub data: Value,
}

/// Push notification emitted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
  /// The provider established (or re-established) a session.
  Connect(WalletAccount),
  /// The provider dropped the session, e.g. from its own UI.
  Disconnect,
}

/// Trait for injected wallet providers.
///
/// Every call is an async boundary; failures come back as the
/// provider's loose `{ message?, code? }` error shape.
#[async_trait]
pub trait WalletProvider: Send + Sync + 'static {
  /// Request a session. With `only_if_trusted` the provider must not
  /// prompt the user.
  async fn connect(&self, options: ConnectOptions) -> Result<WalletAccount, ProviderError>;

  /// End the current session.
  async fn disconnect(&self) -> Result<(), ProviderError>;

  /// Chain identifier of the active network.
  async fn get_chain_id(&self) -> Result<String, ProviderError>;

  /// Sign (and by default broadcast) one or more contract actions.
  async fn sign_transaction(
    &self,
    request: &TransactionRequest,
    options: Option<SignOptions>,
  ) -> Result<ProviderResponse, ProviderError>;

  /// Sign an already-formatted message.
  async fn sign_message(&self, message: &str) -> Result<ProviderResponse, ProviderError>;

  /// Run a marketplace purchase flow for `item_type`/`item_id`.
  async fn purchase_item(
    &self,
    item_type: &str,
    item_id: &str,
  ) -> Result<ProviderResponse, ProviderError>;

  /// Subscribe to `connect`/`disconnect` events.
  ///
  /// `None` when the provider has no event interface. Dropping the
  /// receiver unsubscribes.
  fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>>;
}
