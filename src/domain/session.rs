//! Wallet session state machine.
//!
//! `WalletSession` is the single source of truth for a mounted adapter.
//! Every mutation goes through [`WalletSession::apply`]: user operations,
//! the liveness probe, provider events and cooldown timers all feed
//! [`Signal`]s into the same transition function.
//!
//! Explicit disconnects and interactive connects bump
//! `session_generation`. Silent connect results (liveness probe, eager
//! connect) and cooldown timers carry the generation they were started
//! under and are discarded once it has moved on. A silent call already
//! in flight when the user disconnected cannot resurrect the session,
//! and one that started before an interactive connect cannot wipe it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::clean_account_id;

/// Account identity returned by the provider on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    /// Raw account id, possibly suffixed (`name@domain`).
    #[serde(rename = "blockchainid")]
    pub blockchain_id: String,
    /// Account public key.
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl WalletAccount {
    pub fn new(blockchain_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            blockchain_id: blockchain_id.into(),
            public_key: public_key.into(),
        }
    }
}

/// Coarse connection phase, derived from the session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
        }
    }
}

/// Input to the session transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Provider presence was (re)checked. Losing the provider ends any
    /// live session.
    Detected(bool),
    /// A user operation began: loading on, error cleared.
    OperationStarted,
    /// A user operation ended, successfully or not.
    OperationFinished,
    /// A user operation failed with a user-facing message.
    OperationFailed(String),
    /// Interactive connect began. Also lifts any disconnect suppression.
    ConnectStarted,
    /// Interactive connect succeeded; opens a new generation.
    Connected(WalletAccount),
    /// Chain id arrived for the current session.
    ChainIdResolved(String),
    /// Explicit disconnect began; opens a new generation.
    DisconnectStarted,
    /// Local session is torn down.
    Cleared,
    /// Cooldown scheduled under `generation` has elapsed.
    CooldownElapsed { generation: u64 },
    /// One-shot guard for eager connect. Rejected if already set.
    EagerConnectAttempted,
    /// A silent trusted-only connect (liveness probe or eager connect)
    /// found a session.
    ProbeSucceeded { generation: u64, account: WalletAccount },
    /// Liveness probe found no trusted session.
    ProbeFailed { generation: u64 },
    /// Provider pushed a `connect` event.
    ProviderConnected(WalletAccount),
    /// Provider pushed a `disconnect` event.
    ProviderDisconnected,
}

/// Ephemeral per-mount wallet session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    is_installed: bool,
    account: Option<WalletAccount>,
    chain_id: Option<String>,
    error: Option<String>,
    is_loading: bool,
    has_attempted_eager_connect: bool,
    is_disconnecting: bool,
    session_generation: u64,
    connected_at: Option<DateTime<Utc>>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.is_installed
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    pub fn account(&self) -> Option<&WalletAccount> {
        self.account.as_ref()
    }

    pub fn raw_account_id(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.blockchain_id.as_str())
    }

    /// Account id with any `@domain` suffix removed.
    pub fn account_id(&self) -> String {
        clean_account_id(self.raw_account_id())
    }

    pub fn public_key(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.public_key.as_str())
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_attempted_eager_connect(&self) -> bool {
        self.has_attempted_eager_connect
    }

    pub fn is_disconnecting(&self) -> bool {
        self.is_disconnecting
    }

    pub fn session_generation(&self) -> u64 {
        self.session_generation
    }

    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }

    pub fn phase(&self) -> ConnectionPhase {
        if self.is_disconnecting {
            ConnectionPhase::Disconnecting
        } else if self.account.is_some() {
            ConnectionPhase::Connected
        } else if self.is_loading {
            ConnectionPhase::Connecting
        } else {
            ConnectionPhase::Disconnected
        }
    }

    /// Whether a probe or cooldown started under `generation` still
    /// applies to the current session.
    fn is_current(&self, generation: u64) -> bool {
        !self.is_disconnecting && generation == self.session_generation
    }

    /// Apply one signal. Returns `false` when the signal was rejected
    /// (stale generation, suppressed by an explicit disconnect, guard
    /// already set, or nothing to act on).
    pub fn apply(&mut self, signal: Signal) -> bool {
        match signal {
            Signal::Detected(installed) => {
                self.is_installed = installed;
                if !installed {
                    self.clear();
                }
                true
            }
            Signal::OperationStarted => {
                self.is_loading = true;
                self.error = None;
                true
            }
            Signal::OperationFinished => {
                self.is_loading = false;
                true
            }
            Signal::OperationFailed(message) => {
                self.error = Some(message);
                true
            }
            Signal::ConnectStarted => {
                self.is_loading = true;
                self.error = None;
                self.is_disconnecting = false;
                true
            }
            Signal::Connected(account) => {
                self.session_generation += 1;
                self.adopt(account);
                true
            }
            Signal::ChainIdResolved(chain_id) => {
                if self.account.is_none() {
                    return false;
                }
                self.chain_id = Some(chain_id);
                true
            }
            Signal::DisconnectStarted => {
                self.is_loading = true;
                self.error = None;
                self.is_disconnecting = true;
                self.session_generation += 1;
                true
            }
            Signal::Cleared => {
                self.clear();
                true
            }
            Signal::CooldownElapsed { generation } => {
                if generation != self.session_generation || !self.is_disconnecting {
                    return false;
                }
                self.is_disconnecting = false;
                true
            }
            Signal::EagerConnectAttempted => {
                if self.has_attempted_eager_connect {
                    return false;
                }
                self.has_attempted_eager_connect = true;
                true
            }
            Signal::ProbeSucceeded {
                generation,
                account,
            } => {
                if !self.is_current(generation) {
                    return false;
                }
                self.adopt(account);
                true
            }
            Signal::ProbeFailed { generation } => {
                if !self.is_current(generation) || self.account.is_none() {
                    return false;
                }
                self.clear();
                true
            }
            Signal::ProviderConnected(account) => {
                if self.is_disconnecting {
                    return false;
                }
                self.adopt(account);
                true
            }
            Signal::ProviderDisconnected => {
                if self.is_disconnecting || self.account.is_none() {
                    return false;
                }
                self.clear();
                true
            }
        }
    }

    fn adopt(&mut self, account: WalletAccount) {
        if self.account.as_ref() != Some(&account) {
            self.connected_at = Some(Utc::now());
        }
        self.account = Some(account);
    }

    fn clear(&mut self) {
        self.account = None;
        self.chain_id = None;
        self.connected_at = None;
    }
}

/// Flat JSON projection of a session for UI consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub is_installed: bool,
    pub is_connected: bool,
    pub account_id: String,
    pub raw_account_id: Option<String>,
    pub public_key: Option<String>,
    pub chain_id: Option<String>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub has_attempted_eager_connect: bool,
    pub is_disconnecting: bool,
    pub phase: ConnectionPhase,
    pub connected_at: Option<DateTime<Utc>>,
}

impl From<&WalletSession> for SessionView {
    fn from(session: &WalletSession) -> Self {
        Self {
            is_installed: session.is_installed,
            is_connected: session.is_connected(),
            account_id: session.account_id(),
            raw_account_id: session.raw_account_id().map(str::to_string),
            public_key: session.public_key().map(str::to_string),
            chain_id: session.chain_id.clone(),
            error: session.error.clone(),
            is_loading: session.is_loading,
            has_attempted_eager_connect: session.has_attempted_eager_connect,
            is_disconnecting: session.is_disconnecting,
            phase: session.phase(),
            connected_at: session.connected_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> WalletAccount {
        WalletAccount::new("alice@ultra", "EOS6pubkey")
    }

    fn connected() -> WalletSession {
        let mut session = WalletSession::new();
        session.apply(Signal::Connected(alice()));
        session.apply(Signal::ChainIdResolved("ultra-mainnet".into()));
        session
    }

    #[test]
    fn test_default_session_is_empty() {
        let session = WalletSession::new();
        assert!(!session.is_connected());
        assert_eq!(session.account_id(), "");
        assert_eq!(session.phase(), ConnectionPhase::Disconnected);
        assert!(session.error().is_none());
    }

    #[test]
    fn test_connected_implies_account_and_key() {
        let session = connected();
        assert!(session.is_connected());
        assert_eq!(session.raw_account_id(), Some("alice@ultra"));
        assert_eq!(session.account_id(), "alice");
        assert_eq!(session.public_key(), Some("EOS6pubkey"));
        assert!(session.connected_at().is_some());
    }

    #[test]
    fn test_eager_guard_fires_once() {
        let mut session = WalletSession::new();
        assert!(session.apply(Signal::EagerConnectAttempted));
        assert!(!session.apply(Signal::EagerConnectAttempted));
        assert!(session.has_attempted_eager_connect());
    }

    #[test]
    fn test_chain_id_ignored_without_session() {
        let mut session = WalletSession::new();
        assert!(!session.apply(Signal::ChainIdResolved("x".into())));
        assert!(session.chain_id().is_none());
    }

    #[test]
    fn test_disconnect_opens_generation_and_suppresses_probe() {
        let mut session = WalletSession::new();
        let before = session.session_generation();
        session.apply(Signal::DisconnectStarted);

        assert!(session.is_disconnecting());
        assert_eq!(session.phase(), ConnectionPhase::Disconnecting);
        assert!(!session.apply(Signal::ProbeSucceeded {
            generation: before + 1,
            account: alice(),
        }));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_stale_probe_is_discarded_after_cooldown() {
        let mut session = connected();
        let stale = session.session_generation();

        session.apply(Signal::DisconnectStarted);
        session.apply(Signal::Cleared);
        let current = session.session_generation();
        assert!(session.apply(Signal::CooldownElapsed { generation: current }));

        // Probe started before the disconnect lands after the cooldown.
        assert!(!session.apply(Signal::ProbeSucceeded {
            generation: stale,
            account: alice(),
        }));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_stale_cooldown_does_not_lift_newer_disconnect() {
        let mut session = WalletSession::new();
        session.apply(Signal::DisconnectStarted);
        let first = session.session_generation();
        session.apply(Signal::DisconnectStarted);

        assert!(!session.apply(Signal::CooldownElapsed { generation: first }));
        assert!(session.is_disconnecting());
    }

    #[test]
    fn test_probe_failure_clears_live_session() {
        let mut session = connected();
        let generation = session.session_generation();
        assert!(session.apply(Signal::ProbeFailed { generation }));
        assert!(!session.is_connected());
        assert!(session.chain_id().is_none());
    }

    #[test]
    fn test_interactive_connect_outdates_inflight_probe() {
        let mut session = WalletSession::new();
        let started = session.session_generation();

        session.apply(Signal::ConnectStarted);
        session.apply(Signal::Connected(alice()));
        assert!(session.session_generation() > started);

        assert!(!session.apply(Signal::ProbeFailed { generation: started }));
        assert!(session.is_connected());
    }

    #[test]
    fn test_silent_connect_rejected_after_disconnect() {
        let mut session = connected();
        let started = session.session_generation();

        session.apply(Signal::DisconnectStarted);
        session.apply(Signal::Cleared);
        assert!(!session.apply(Signal::ProbeSucceeded {
            generation: started,
            account: alice(),
        }));
        assert!(!session.is_connected());
        assert_eq!(session.phase(), ConnectionPhase::Disconnecting);
    }

    #[test]
    fn test_losing_provider_ends_session() {
        let mut session = connected();
        session.apply(Signal::Detected(true));

        assert!(session.apply(Signal::Detected(false)));
        assert!(!session.is_installed());
        assert!(!session.is_connected());
        assert!(session.chain_id().is_none());
    }

    #[test]
    fn test_probe_failure_without_session_is_noop() {
        let mut session = WalletSession::new();
        assert!(!session.apply(Signal::ProbeFailed { generation: 0 }));
    }

    #[test]
    fn test_provider_events() {
        let mut session = WalletSession::new();
        assert!(session.apply(Signal::ProviderConnected(alice())));
        assert!(session.is_connected());

        assert!(session.apply(Signal::ProviderDisconnected));
        assert!(!session.is_connected());
        assert!(session.raw_account_id().is_none());
        assert!(session.public_key().is_none());
    }

    #[test]
    fn test_provider_connect_ignored_while_disconnecting() {
        let mut session = WalletSession::new();
        session.apply(Signal::DisconnectStarted);
        assert!(!session.apply(Signal::ProviderConnected(alice())));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_connect_lifts_suppression() {
        let mut session = WalletSession::new();
        session.apply(Signal::DisconnectStarted);
        session.apply(Signal::OperationFinished);
        session.apply(Signal::ConnectStarted);

        assert!(!session.is_disconnecting());
        assert!(session.is_loading());
        assert_eq!(session.phase(), ConnectionPhase::Connecting);
    }

    #[test]
    fn test_readopting_same_account_keeps_timestamp() {
        let mut session = connected();
        let since = session.connected_at();
        let generation = session.session_generation();
        session.apply(Signal::ProbeSucceeded {
            generation,
            account: alice(),
        });
        assert_eq!(session.connected_at(), since);
    }

    #[test]
    fn test_view_projection() {
        let view = SessionView::from(&connected());
        assert!(view.is_connected);
        assert_eq!(view.account_id, "alice");
        assert_eq!(view.phase, ConnectionPhase::Connected);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["rawAccountId"], "alice@ultra");
        assert_eq!(json["chainId"], "ultra-mainnet");
        assert_eq!(json["phase"], "connected");
    }
}
