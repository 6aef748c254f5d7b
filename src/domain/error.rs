//! Wallet error types.
//!
//! `ProviderError` mirrors the loose `{ message?, code? }` shape the
//! injected provider rejects with. `WalletError` is the adapter-level
//! taxonomy whose `Display` strings are what the session exposes in
//! its `error` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code the provider uses for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Error returned by the injected wallet provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", .message.as_deref().unwrap_or("unknown provider error"))]
pub struct ProviderError {
    /// Human-readable message, when the provider sends one.
    #[serde(default)]
    pub message: Option<String>,
    /// Numeric error code, when the provider sends one.
    #[serde(default)]
    pub code: Option<i64>,
}

impl ProviderError {
    /// Error with a message and no code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            code: None,
        }
    }

    /// Error with both a message and a code.
    pub fn with_code(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: Some(message.into()),
            code: Some(code),
        }
    }

    /// The canonical "user rejected" error (code 4001).
    pub fn user_rejected() -> Self {
        Self::with_code("User rejected the request", USER_REJECTED_CODE)
    }

    /// The provider message, or `fallback` when it sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        match self.message.as_deref() {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Whether this error signals that the user cancelled or rejected
    /// the request, either by code or by a marker substring in the
    /// message (matched case-insensitively).
    pub fn is_user_rejection(&self, codes: &[i64], markers: &[String]) -> bool {
        if let Some(code) = self.code {
            if codes.contains(&code) {
                return true;
            }
        }

        let Some(message) = self.message.as_deref() else {
            return false;
        };
        let message = message.to_lowercase();
        markers
            .iter()
            .any(|marker| !marker.is_empty() && message.contains(&marker.to_lowercase()))
    }
}

/// Adapter-level failure taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No provider is present on the host.
    #[error("{provider} is not installed")]
    NotInstalled {
        /// Display name of the expected provider.
        provider: String,
    },

    /// An operation needing a session ran without one.
    #[error("Wallet not connected")]
    NotConnected,

    /// The provider rejected the call.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
