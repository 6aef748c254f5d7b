//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Environment variable overriding the config path.
pub const CONFIG_ENV: &str = "WALLET_CONFIG";

/// Default config path.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Config path from `WALLET_CONFIG`, falling back to `config.toml`.
pub fn config_path() -> String {
  std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    provider = %config.adapter.provider_name,
    poll_interval_ms = config.adapter.poll_interval_ms,
    bind = %config.server.bind_address,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  let adapter = &config.adapter;

  anyhow::ensure!(
    !adapter.provider_name.trim().is_empty(),
    "provider_name must not be empty"
  );
  anyhow::ensure!(
    adapter.poll_interval_ms > 0,
    "poll_interval_ms must be positive"
  );
  anyhow::ensure!(
    !adapter.message_prefixes.is_empty(),
    "message_prefixes must not be empty"
  );
  anyhow::ensure!(
    !adapter.default_message_prefix.is_empty(),
    "default_message_prefix must not be empty"
  );
  anyhow::ensure!(
    adapter
      .message_prefixes
      .iter()
      .any(|p| p == &adapter.default_message_prefix),
    "default_message_prefix {:?} must be one of message_prefixes",
    adapter.default_message_prefix
  );

  anyhow::ensure!(
    !config.server.bind_address.is_empty(),
    "server bind_address must not be empty"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.adapter.provider_name, "Ultra Wallet");
    assert_eq!(config.adapter.poll_interval_ms, 2_000);
    assert_eq!(config.adapter.disconnect_cooldown_ms, 1_000);
    assert_eq!(config.adapter.rejection_cooldown_ms, 500);
    assert_eq!(config.adapter.failure_cooldown_ms, 2_000);
    assert_eq!(config.adapter.rejection_codes, vec![4001]);
    assert!(config.logging.json);
  }

  #[test]
  fn test_overrides() {
    let config = parse_config(
      r#"
        [adapter]
        provider_name = "Test Wallet"
        poll_interval_ms = 500

        [simulation]
        trusted = true
      "#,
    )
    .unwrap();
    assert_eq!(config.adapter.provider_name, "Test Wallet");
    assert_eq!(config.adapter.poll_interval_ms, 500);
    assert!(config.simulation.trusted);
    assert!(config.simulation.auto_approve);
  }

  #[test]
  fn test_rejects_zero_poll_interval() {
    let err = parse_config("[adapter]\npoll_interval_ms = 0\n").unwrap_err();
    assert!(err.to_string().contains("poll_interval_ms"));
  }

  #[test]
  fn test_rejects_default_prefix_outside_table() {
    let result = parse_config(
      r#"
        [adapter]
        message_prefixes = ["0x"]
        default_message_prefix = "message:"
      "#,
    );
    assert!(result.is_err());
  }
}
