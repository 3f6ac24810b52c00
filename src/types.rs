use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use web3::types::{Address, H256};

#[derive(Error, Debug)]
pub enum FlywheelError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Symbol {symbol} not found in contract table for {network}")]
    UnknownSymbol { network: String, symbol: String },

    #[error("Web3 calls failed with {0}")]
    ReadCallsFailed(String),

    #[error("TX FAILED: {0}")]
    TransactionFailed(String),

    #[error(transparent)]
    Web3(#[from] web3::Error),

    #[error(transparent)]
    Contract(#[from] web3::contract::Error),

    #[error(transparent)]
    Abi(#[from] ethabi::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlywheelError>;

/// Pool-token address -> borrower addresses, in first-seen order.
pub type BorrowersByToken = BTreeMap<Address, Vec<Address>>;

/// One participant as reported by the account API. Fields not modeled here are
/// carried in `extra` so a saved fixture keeps the record as fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRecord {
    pub address: Address,
    #[serde(default)]
    pub tokens: Vec<TokenPosition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPosition {
    pub address: Address,
    pub borrow_balance_underlying: PreciseValue,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The API reports magnitudes as `{ "value": "0.15" }`, sometimes with a bare number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreciseValue {
    pub value: DecimalValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DecimalValue {
    Number(f64),
    Text(String),
}

impl DecimalValue {
    /// Unparseable text counts as zero.
    pub fn is_positive(&self) -> bool {
        match self {
            DecimalValue::Number(n) => *n > 0.0,
            DecimalValue::Text(s) => s.trim().parse::<f64>().map_or(false, |v| v > 0.0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
    pub pagination_summary: Option<PaginationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationSummary {
    pub total_pages: Option<u32>,
}

/// What one run did, logged by `main` on the way out.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub uninitialized_before: BorrowersByToken,
    pub transactions: Vec<H256>,
    pub uninitialized_after: BorrowersByToken,
}
