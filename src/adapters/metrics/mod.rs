//! Metrics and Monitoring Adapters
//!
//! Prometheus session metrics plus an axum server for health probes,
//! the session JSON view and metrics export.

pub mod health;
pub mod prometheus;

pub use health::SessionServer;
pub use prometheus::SessionMetrics;
