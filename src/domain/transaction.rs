//! Transaction payloads forwarded to the provider.
//!
//! The adapter never inspects or validates these; they are shaped the
//! way the provider expects and passed through verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Contract that handles native token transfers.
pub const TOKEN_CONTRACT: &str = "eosio.token";

/// Contract that handles NFT marketplace purchases.
pub const NFT_CONTRACT: &str = "eosio.nft.ft";

/// A single contract action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionObject {
    /// Action name (e.g. `transfer`, `buy`).
    pub action: String,
    /// Contract account executing the action.
    pub contract: String,
    /// Action arguments, opaque to the adapter.
    pub data: Value,
}

impl TransactionObject {
    /// Arbitrary action.
    pub fn new(action: impl Into<String>, contract: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            contract: contract.into(),
            data,
        }
    }

    /// Token transfer, `quantity` in the chain's asset notation
    /// (e.g. `"1.00000000 UOS"`).
    pub fn token_transfer(from: &str, to: &str, quantity: &str, memo: &str) -> Self {
        Self::new(
            "transfer",
            TOKEN_CONTRACT,
            json!({
                "from": from,
                "to": to,
                "quantity": quantity,
                "memo": memo,
            }),
        )
    }

    /// Marketplace purchase of a resale-listed NFT.
    pub fn nft_purchase(token_id: u64, buyer: &str, max_price: &str, memo: &str) -> Self {
        Self::new(
            "buy",
            NFT_CONTRACT,
            json!({
                "buy": {
                    "token_id": token_id,
                    "buyer": buyer,
                    "receiver": buyer,
                    "max_price": max_price,
                    "memo": memo,
                    "promoter_id": null,
                }
            }),
        )
    }
}

/// One action or a batch, serialized as an object or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionRequest {
    Single(TransactionObject),
    Batch(Vec<TransactionObject>),
}

impl TransactionRequest {
    /// Number of actions in the request.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(actions) => actions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<TransactionObject> for TransactionRequest {
    fn from(tx: TransactionObject) -> Self {
        Self::Single(tx)
    }
}

impl From<Vec<TransactionObject>> for TransactionRequest {
    fn from(txs: Vec<TransactionObject>) -> Self {
        Self::Batch(txs)
    }
}

/// Options forwarded with `signTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOptions {
    /// Sign without broadcasting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_only: Option<bool>,
    /// Any other provider-specific option, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
