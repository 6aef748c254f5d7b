//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` and the
//! infrastructure around the adapter.
//!
//! Adapter categories:
//! - `host`: Provider slot with asynchronous injection and load state
//! - `provider`: Simulated wallet provider
//! - `metrics`: Prometheus metrics and the health/session HTTP server

pub mod host;
pub mod metrics;
pub mod provider;
