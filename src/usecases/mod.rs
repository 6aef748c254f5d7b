//! Use Cases Layer - Application Logic
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `WalletAdapter`: Wallet session lifecycle over an injected provider

pub mod wallet_adapter;

pub use wallet_adapter::WalletAdapter;
