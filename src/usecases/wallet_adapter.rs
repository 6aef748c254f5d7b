//! Wallet Adapter Use Case - Session Management over an Injected Provider
//!
//! Exposes one reactive `WalletSession` plus connect/disconnect/sign
//! operations to a UI layer, hiding the provider's raw async API behind
//! consistent loading/error semantics.
//!
//! Background work while mounted:
//! - eager (silent) connect, at most once per mount
//! - re-detection when the host reports it has fully loaded
//! - provider `connect`/`disconnect` events (fast path)
//! - a fixed-interval liveness probe (reconciliation path)
//!
//! All of them feed signals into `WalletSession::apply`, published
//! through a `watch` channel. User operations are serialized by a
//! single-slot lock; background work is not.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::config::AdapterConfig;
use crate::domain::account::clean_account_id;
use crate::domain::error::{ProviderError, WalletError};
use crate::domain::message::MessageFormat;
use crate::domain::session::{SessionView, Signal, WalletSession};
use crate::domain::transaction::{SignOptions, TransactionRequest};
use crate::ports::host::ProviderHost;
use crate::ports::wallet_provider::{
  ConnectOptions, ProviderEvent, ProviderResponse, WalletProvider,
};

const CONNECT_FAILED: &str = "Failed to connect wallet";
const DISCONNECT_FAILED: &str = "Failed to disconnect wallet";
const SIGN_TRANSACTION_FAILED: &str = "Failed to sign transaction";
const SIGN_MESSAGE_FAILED: &str = "Failed to sign message";
const PURCHASE_FAILED: &str = "Failed to purchase item";

type ProviderSlot = Option<Arc<dyn WalletProvider>>;

/// Feed one signal into the session, notifying subscribers only when
/// something changed. Returns whether the signal was accepted.
fn apply_signal(state: &watch::Sender<WalletSession>, signal: Signal) -> bool {
  let mut accepted = false;
  state.send_if_modified(|session| {
    let before = session.clone();
    accepted = session.apply(signal);
    *session != before
  });
  accepted
}

/// Clears `is_loading` when dropped, including when the operation
/// future itself is dropped mid-await.
struct LoadingGuard<'a> {
  state: &'a watch::Sender<WalletSession>,
}

impl<'a> LoadingGuard<'a> {
  fn new(state: &'a watch::Sender<WalletSession>) -> Self {
    Self { state }
  }
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    apply_signal(self.state, Signal::OperationFinished);
  }
}

/// Wallet connection adapter for one mounted session.
pub struct WalletAdapter {
  host: Arc<dyn ProviderHost>,
  config: AdapterConfig,
  format: MessageFormat,
  /// Detected provider; watched by the session loop for late injection.
  provider: watch::Sender<ProviderSlot>,
  /// Published session state.
  state: Arc<watch::Sender<WalletSession>>,
  /// Serializes user-initiated operations.
  op_lock: Mutex<()>,
  shutdown_tx: broadcast::Sender<()>,
  tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl WalletAdapter {
  /// Create an adapter and run initial detection, without starting any
  /// background work. Use [`WalletAdapter::mount`] for the full
  /// lifecycle.
  pub fn new(host: Arc<dyn ProviderHost>, config: AdapterConfig) -> Self {
    let (provider, _) = watch::channel(None);
    let (state, _) = watch::channel(WalletSession::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    let adapter = Self {
      host,
      format: config.message_format(),
      config,
      provider,
      state: Arc::new(state),
      op_lock: Mutex::new(()),
      shutdown_tx,
      tasks: StdMutex::new(Vec::new()),
    };
    adapter.detect();
    adapter
  }

  /// Create an adapter and start its background tasks: load watcher,
  /// session loop (events + liveness probe) and the automatic eager
  /// connect. Must be called inside a tokio runtime.
  pub fn mount(host: Arc<dyn ProviderHost>, config: AdapterConfig) -> Arc<Self> {
    let adapter = Arc::new(Self::new(host, config));

    let load = tokio::spawn(Self::watch_load(
      Arc::downgrade(&adapter),
      Arc::clone(&adapter.host),
      adapter.shutdown_tx.subscribe(),
    ));
    let session = tokio::spawn(Self::run_session_loop(
      Arc::downgrade(&adapter),
      adapter.shutdown_tx.subscribe(),
    ));
    adapter.track(load);
    adapter.track(session);

    info!(
      provider = %adapter.config.provider_name,
      installed = adapter.is_installed(),
      "Wallet adapter mounted"
    );
    adapter
  }

  /// Stop all background work: listeners, the probe interval and any
  /// pending cooldowns. In-flight user operations run to completion.
  ///
  /// Dropping the last handle to a mounted adapter has the same effect.
  pub fn unmount(&self) {
    self.stop_background();
    info!("Wallet adapter unmounted");
  }

  fn stop_background(&self) {
    let _ = self.shutdown_tx.send(());
    if let Ok(mut tasks) = self.tasks.lock() {
      for handle in tasks.drain(..) {
        handle.abort();
      }
    }
  }

  // ── Session accessors ─────────────────────────────────────

  /// Subscribe to session changes.
  pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
    self.state.subscribe()
  }

  /// Clone of the current session.
  pub fn snapshot(&self) -> WalletSession {
    self.state.borrow().clone()
  }

  /// Flat JSON-ready view of the current session.
  pub fn view(&self) -> SessionView {
    SessionView::from(&*self.state.borrow())
  }

  pub fn is_installed(&self) -> bool {
    self.state.borrow().is_installed()
  }

  /// Cleaned account id (`name` of `name@domain`), empty if none.
  pub fn account_id(&self) -> String {
    self.state.borrow().account_id()
  }

  pub fn config(&self) -> &AdapterConfig {
    &self.config
  }

  // ── Detection ─────────────────────────────────────────────

  /// Re-check the host for an injected provider. Returns whether one
  /// is present.
  pub fn detect(&self) -> bool {
    let found = self.host.provider();
    let installed = found.is_some();

    self.provider.send_if_modified(|slot| {
      let same = match (slot.as_ref(), found.as_ref()) {
        (Some(old), Some(new)) => Arc::ptr_eq(old, new),
        (None, None) => true,
        _ => false,
      };
      if !same {
        *slot = found;
      }
      !same
    });
    self.apply(Signal::Detected(installed));
    installed
  }

  fn current_provider(&self) -> ProviderSlot {
    self.provider.borrow().clone()
  }

  fn require_installed(&self) -> Result<Arc<dyn WalletProvider>, WalletError> {
    self.current_provider().ok_or_else(|| WalletError::NotInstalled {
      provider: self.config.provider_name.clone(),
    })
  }

  fn require_session(&self) -> Result<Arc<dyn WalletProvider>, WalletError> {
    let provider = self.current_provider().ok_or(WalletError::NotConnected)?;
    if !self.state.borrow().is_connected() {
      return Err(WalletError::NotConnected);
    }
    Ok(provider)
  }

  // ── User operations ───────────────────────────────────────

  /// Interactive connect. Returns `true` iff the provider call itself
  /// succeeded; a failed chain id lookup afterwards does not count.
  #[instrument(skip(self))]
  pub async fn connect(&self, options: Option<ConnectOptions>) -> bool {
    let _op = self.op_lock.lock().await;

    let provider = match self.require_installed() {
      Ok(provider) => provider,
      Err(e) => {
        self.fail(e);
        return false;
      }
    };

    self.apply(Signal::ConnectStarted);
    let _loading = LoadingGuard::new(&self.state);

    match provider.connect(options.unwrap_or_default()).await {
      Ok(account) => {
        info!(
          account = %clean_account_id(Some(account.blockchain_id.as_str())),
          "Wallet connected"
        );
        self.apply(Signal::Connected(account));
        self.refresh_chain_id(provider.as_ref()).await;
        true
      }
      Err(e) => {
        self.fail_with(&e, CONNECT_FAILED);
        false
      }
    }
  }

  /// Silent connect, at most once per adapter. Never prompts, never
  /// touches `is_loading`/`error`, swallows every failure. A result that
  /// lands after an explicit disconnect or interactive connect is dropped.
  #[instrument(skip(self))]
  pub async fn eager_connect(&self) -> bool {
    if !self.apply(Signal::EagerConnectAttempted) {
      return false;
    }

    let Some(provider) = self.current_provider() else {
      debug!("Eager connect skipped: provider not installed");
      return false;
    };
    let generation = self.state.borrow().session_generation();

    match provider.connect(ConnectOptions::trusted_only()).await {
      Ok(account) => {
        let account_id = clean_account_id(Some(account.blockchain_id.as_str()));
        if !self.apply(Signal::ProbeSucceeded {
          generation,
          account,
        }) {
          debug!(generation, "Discarding stale eager connect result");
          return false;
        }
        info!(account = %account_id, "Wallet reconnected silently");
        self.refresh_chain_id(provider.as_ref()).await;
        true
      }
      Err(e) => {
        debug!(error = %e, "Eager connect declined");
        false
      }
    }
  }

  /// End the session. Returns `true` only when the provider confirmed.
  ///
  /// A user-cancelled disconnect leaves the session untouched. Any
  /// other provider failure still tears the local session down.
  #[instrument(skip(self))]
  pub async fn disconnect(&self) -> bool {
    let _op = self.op_lock.lock().await;

    let Some(provider) = self.current_provider() else {
      return false;
    };

    self.apply(Signal::DisconnectStarted);
    let generation = self.state.borrow().session_generation();
    let _loading = LoadingGuard::new(&self.state);

    match provider.disconnect().await {
      Ok(()) => {
        self.apply(Signal::Cleared);
        info!("Wallet disconnected");
        self.schedule_cooldown(generation, self.config.disconnect_cooldown());
        true
      }
      Err(e) if e.is_user_rejection(&self.config.rejection_codes, &self.config.rejection_markers) => {
        info!(error = %e, "Disconnect cancelled by user");
        self.schedule_cooldown(generation, self.config.rejection_cooldown());
        false
      }
      Err(e) => {
        self.apply(Signal::Cleared);
        self.fail_with(&e, DISCONNECT_FAILED);
        self.schedule_cooldown(generation, self.config.failure_cooldown());
        false
      }
    }
  }

  /// Forward one action or a batch to the provider for signing.
  #[instrument(skip_all)]
  pub async fn sign_transaction(
    &self,
    request: impl Into<TransactionRequest>,
    options: Option<SignOptions>,
  ) -> Option<ProviderResponse> {
    let request = request.into();
    let _op = self.op_lock.lock().await;

    let provider = match self.require_session() {
      Ok(provider) => provider,
      Err(e) => {
        self.fail(e);
        return None;
      }
    };

    debug!(actions = request.len(), "Forwarding transaction for signing");
    self
      .forward(SIGN_TRANSACTION_FAILED, provider.sign_transaction(&request, options))
      .await
  }

  /// Sign a message, tagging untagged free text with the text prefix.
  #[instrument(skip_all)]
  pub async fn sign_message(&self, message: &str) -> Option<ProviderResponse> {
    let _op = self.op_lock.lock().await;

    let provider = match self.require_session() {
      Ok(provider) => provider,
      Err(e) => {
        self.fail(e);
        return None;
      }
    };

    let formatted = self.format.format(message);
    self
      .forward(SIGN_MESSAGE_FAILED, provider.sign_message(&formatted))
      .await
  }

  /// Run the provider's marketplace purchase flow.
  #[instrument(skip(self))]
  pub async fn purchase_item(&self, item_type: &str, item_id: &str) -> Option<ProviderResponse> {
    let _op = self.op_lock.lock().await;

    let provider = match self.require_session() {
      Ok(provider) => provider,
      Err(e) => {
        self.fail(e);
        return None;
      }
    };

    self
      .forward(PURCHASE_FAILED, provider.purchase_item(item_type, item_id))
      .await
  }

  /// Run one pass-through provider call with loading/error bookkeeping.
  async fn forward<F>(&self, fallback: &str, call: F) -> Option<ProviderResponse>
  where
    F: Future<Output = Result<ProviderResponse, ProviderError>>,
  {
    self.apply(Signal::OperationStarted);
    let _loading = LoadingGuard::new(&self.state);

    match call.await {
      Ok(response) => Some(response),
      Err(e) => {
        self.fail_with(&e, fallback);
        None
      }
    }
  }

  // ── Background: liveness, events, load ───────────────────

  /// One liveness probe: a silent trusted-only connect.
  ///
  /// Success adopts the session, failure while connected is treated as
  /// an external disconnect. Skipped during an explicit disconnect, and
  /// results from a probe started before one are discarded.
  pub async fn probe_liveness(&self) {
    let Some(provider) = self.current_provider() else {
      return;
    };

    let generation = {
      let session = self.state.borrow();
      if session.is_disconnecting() {
        debug!("Liveness probe skipped during disconnect");
        return;
      }
      session.session_generation()
    };

    match provider.connect(ConnectOptions::trusted_only()).await {
      Ok(account) => {
        if self.apply(Signal::ProbeSucceeded {
          generation,
          account,
        }) {
          self.refresh_chain_id(provider.as_ref()).await;
        } else {
          debug!(generation, "Discarding stale liveness result");
        }
      }
      Err(e) => {
        if self.apply(Signal::ProbeFailed { generation }) {
          info!(error = %e, "Wallet session ended outside the adapter");
        }
      }
    }
  }

  /// Apply a provider-pushed event.
  pub async fn handle_event(&self, event: ProviderEvent) {
    match event {
      ProviderEvent::Connect(account) => {
        let account_id = clean_account_id(Some(account.blockchain_id.as_str()));
        if self.apply(Signal::ProviderConnected(account)) {
          info!(account = %account_id, "Provider reported connect");
          if let Some(provider) = self.current_provider() {
            self.refresh_chain_id(provider.as_ref()).await;
          }
        }
      }
      ProviderEvent::Disconnect => {
        if self.apply(Signal::ProviderDisconnected) {
          info!("Provider reported disconnect");
        }
      }
    }
  }

  /// Fire eager connect in the background if the session calls for it.
  fn maybe_eager_connect(self: &Arc<Self>) {
    let due = {
      let session = self.state.borrow();
      session.is_installed() && !session.is_connected() && !session.has_attempted_eager_connect()
    };
    if !due {
      return;
    }

    let adapter = Arc::clone(self);
    let handle = tokio::spawn(async move {
      adapter.eager_connect().await;
    });
    self.track(handle);
  }

  /// Subscribe to the current provider's events and kick off eager
  /// connect if due.
  fn attach(self: &Arc<Self>) -> Option<broadcast::Receiver<ProviderEvent>> {
    let events = self.current_provider().and_then(|p| p.subscribe());
    self.maybe_eager_connect();
    events
  }

  #[instrument(skip_all)]
  async fn watch_load(
    adapter: Weak<Self>,
    host: Arc<dyn ProviderHost>,
    mut shutdown_rx: broadcast::Receiver<()>,
  ) {
    tokio::select! {
      biased;
      _ = shutdown_rx.recv() => {}
      _ = host.loaded() => {
        if let Some(adapter) = adapter.upgrade() {
          let installed = adapter.detect();
          debug!(installed, "Host loaded, provider re-detected");
        }
      }
    }
  }

  /// Background loop. Holds only a weak handle between wakeups so an
  /// adapter dropped without `unmount` still shuts down.
  #[instrument(skip_all)]
  async fn run_session_loop(adapter: Weak<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
    let Some(this) = adapter.upgrade() else {
      return;
    };
    let mut provider_rx = this.provider.subscribe();
    let mut events = this.attach();
    let period = this.config.poll_interval();
    drop(this);

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          debug!("Session loop shutting down");
          break;
        }
        changed = provider_rx.changed() => {
          if changed.is_err() {
            break;
          }
          provider_rx.borrow_and_update();
          let Some(this) = adapter.upgrade() else {
            break;
          };
          info!("Wallet provider changed, re-attaching");
          events = this.attach();
        }
        event = next_event(&mut events) => {
          let Some(this) = adapter.upgrade() else {
            break;
          };
          match event {
            Ok(event) => this.handle_event(event).await,
            Err(RecvError::Lagged(skipped)) => {
              warn!(skipped, "Provider events lagged, relying on liveness probe");
            }
            Err(RecvError::Closed) => {
              debug!("Provider event stream closed");
              events = None;
            }
          }
        }
        _ = ticker.tick() => {
          let Some(this) = adapter.upgrade() else {
            break;
          };
          this.probe_liveness().await;
        }
      }
    }
  }

  fn schedule_cooldown(&self, generation: u64, delay: Duration) {
    let state = Arc::clone(&self.state);
    let mut shutdown_rx = self.shutdown_tx.subscribe();

    let handle = tokio::spawn(async move {
      tokio::select! {
        _ = shutdown_rx.recv() => {}
        _ = tokio::time::sleep(delay) => {
          apply_signal(&state, Signal::CooldownElapsed { generation });
        }
      }
    });
    self.track(handle);
  }

  async fn refresh_chain_id(&self, provider: &dyn WalletProvider) {
    match provider.get_chain_id().await {
      Ok(chain_id) => {
        self.apply(Signal::ChainIdResolved(chain_id));
      }
      Err(e) => warn!(error = %e, "Failed to fetch chain id"),
    }
  }

  // ── Helpers ───────────────────────────────────────────────

  fn apply(&self, signal: Signal) -> bool {
    apply_signal(&self.state, signal)
  }

  fn fail(&self, error: WalletError) {
    warn!(error = %error, "Wallet operation rejected");
    self.apply(Signal::OperationFailed(error.to_string()));
  }

  fn fail_with(&self, error: &ProviderError, fallback: &str) {
    let message = error.message_or(fallback);
    warn!(code = ?error.code, error = %message, "Wallet provider call failed");
    self.apply(Signal::OperationFailed(message));
  }

  fn track(&self, handle: JoinHandle<()>) {
    if let Ok(mut tasks) = self.tasks.lock() {
      tasks.retain(|h| !h.is_finished());
      tasks.push(handle);
    }
  }
}

impl Drop for WalletAdapter {
  fn drop(&mut self) {
    self.stop_background();
  }
}

async fn next_event(
  events: &mut Option<broadcast::Receiver<ProviderEvent>>,
) -> Result<ProviderEvent, RecvError> {
  match events {
    Some(rx) => rx.recv().await,
    None => std::future::pending().await,
  }
}
