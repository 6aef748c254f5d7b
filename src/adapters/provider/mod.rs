//! Provider Adapters - Implementations of the WalletProvider Port
//!
//! - `in_memory`: simulated wallet used by the demo binary and tests

pub mod in_memory;

pub use in_memory::InMemoryProvider;
