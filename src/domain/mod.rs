//! Domain layer - wallet session logic and provider payload types.
//!
//! Pure logic, no I/O (hexagonal architecture inner ring). The session
//! transition function lives here so it can be tested without a runtime.

pub mod account;
pub mod error;
pub mod message;
pub mod session;
pub mod transaction;

// Re-export core types for convenience
pub use account::clean_account_id;
pub use error::{ProviderError, WalletError};
pub use message::{MessageFormat, format_message};
pub use session::{ConnectionPhase, SessionView, Signal, WalletAccount, WalletSession};
pub use transaction::{SignOptions, TransactionObject, TransactionRequest};
