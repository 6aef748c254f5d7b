//! Configuration Module - TOML-based Adapter Configuration
//!
//! Loads and validates configuration from `config.toml`. Timings,
//! message prefixes and rejection markers are externalized here so
//! the usecase layer never hardcodes provider quirks.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::message::MessageFormat;

/// Top-level application configuration.
///
/// Loaded from `config.toml` at startup. Every section has defaults,
/// so an empty file is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Wallet adapter behavior.
  #[serde(default)]
  pub adapter: AdapterConfig,
  /// Log output.
  #[serde(default)]
  pub logging: LoggingConfig,
  /// Health/session HTTP server.
  #[serde(default)]
  pub server: ServerConfig,
  /// Simulated provider used by the demo binary.
  #[serde(default)]
  pub simulation: SimulationConfig,
}

/// Wallet adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
  /// Display name used in "not installed" errors.
  #[serde(default = "default_provider_name")]
  pub provider_name: String,
  /// Liveness probe interval (milliseconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_ms: u64,
  /// Suppression window after a successful disconnect.
  #[serde(default = "default_disconnect_cooldown")]
  pub disconnect_cooldown_ms: u64,
  /// Suppression window after the user cancels a disconnect.
  #[serde(default = "default_rejection_cooldown")]
  pub rejection_cooldown_ms: u64,
  /// Suppression window after a failed disconnect.
  #[serde(default = "default_failure_cooldown")]
  pub failure_cooldown_ms: u64,
  /// Prefixes that mark a message as already tagged.
  #[serde(default = "default_message_prefixes")]
  pub message_prefixes: Vec<String>,
  /// Prefix prepended to untagged messages.
  #[serde(default = "default_message_prefix")]
  pub default_message_prefix: String,
  /// Error codes meaning "user rejected".
  #[serde(default = "default_rejection_codes")]
  pub rejection_codes: Vec<i64>,
  /// Message substrings meaning "user rejected" (case-insensitive).
  #[serde(default = "default_rejection_markers")]
  pub rejection_markers: Vec<String>,
}

impl Default for AdapterConfig {
  fn default() -> Self {
    Self {
      provider_name: default_provider_name(),
      poll_interval_ms: default_poll_interval(),
      disconnect_cooldown_ms: default_disconnect_cooldown(),
      rejection_cooldown_ms: default_rejection_cooldown(),
      failure_cooldown_ms: default_failure_cooldown(),
      message_prefixes: default_message_prefixes(),
      default_message_prefix: default_message_prefix(),
      rejection_codes: default_rejection_codes(),
      rejection_markers: default_rejection_markers(),
    }
  }
}

impl AdapterConfig {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn disconnect_cooldown(&self) -> Duration {
    Duration::from_millis(self.disconnect_cooldown_ms)
  }

  pub fn rejection_cooldown(&self) -> Duration {
    Duration::from_millis(self.rejection_cooldown_ms)
  }

  pub fn failure_cooldown(&self) -> Duration {
    Duration::from_millis(self.failure_cooldown_ms)
  }

  /// Message prefix table built from this config.
  pub fn message_format(&self) -> MessageFormat {
    MessageFormat::new(
      self.message_prefixes.clone(),
      self.default_message_prefix.clone(),
    )
  }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
  /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Emit JSON lines instead of human-readable output.
  #[serde(default = "default_true")]
  pub json: bool,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      json: default_true(),
    }
  }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Bind address for /live, /ready, /session and /metrics.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind_address: default_bind_address(),
    }
  }
}

/// Simulated provider configuration (demo binary only).
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
  /// Account id the simulated wallet hands out.
  #[serde(default = "default_sim_account")]
  pub account: String,
  /// Public key of that account.
  #[serde(default = "default_sim_public_key")]
  pub public_key: String,
  /// Chain id reported by the simulated wallet.
  #[serde(default = "default_sim_chain_id")]
  pub chain_id: String,
  /// Whether this origin is already trusted (eager connect succeeds).
  #[serde(default)]
  pub trusted: bool,
  /// Whether interactive prompts are approved.
  #[serde(default = "default_true")]
  pub auto_approve: bool,
  /// Delay before the provider is injected into the host.
  #[serde(default = "default_inject_delay")]
  pub inject_delay_ms: u64,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      account: default_sim_account(),
      public_key: default_sim_public_key(),
      chain_id: default_sim_chain_id(),
      trusted: false,
      auto_approve: default_true(),
      inject_delay_ms: default_inject_delay(),
    }
  }
}

// Default value functions for serde

fn default_provider_name() -> String {
  "Ultra Wallet".to_string()
}

fn default_poll_interval() -> u64 {
  2_000
}

fn default_disconnect_cooldown() -> u64 {
  1_000
}

fn default_rejection_cooldown() -> u64 {
  500
}

fn default_failure_cooldown() -> u64 {
  2_000
}

fn default_message_prefixes() -> Vec<String> {
  crate::domain::message::DEFAULT_PREFIXES
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_message_prefix() -> String {
  crate::domain::message::TEXT_PREFIX.to_string()
}

fn default_rejection_codes() -> Vec<i64> {
  vec![crate::domain::error::USER_REJECTED_CODE]
}

fn default_rejection_markers() -> Vec<String> {
  vec!["reject".into(), "cancel".into(), "denied".into()]
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_sim_account() -> String {
  "aa1aa2aa3ag4@ultra".to_string()
}

fn default_sim_public_key() -> String {
  "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV".to_string()
}

fn default_sim_chain_id() -> String {
  "a9c481dfbc7d9506dc7e87e9a137c931b0a9303f64fd7a1d08b8230133920097".to_string()
}

fn default_inject_delay() -> u64 {
  250
}
