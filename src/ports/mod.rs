//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `WalletProvider`: The injected wallet capability object
//! - `ProviderHost`: Provider detection and load-state notification

pub mod host;
pub mod wallet_provider;
