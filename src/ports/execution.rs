//! Execution ports
//!
//! Swap routing (quote + unsigned transaction) and transaction signing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::GasSettings;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("No route found: {0}")]
    NoRoute(String),
    #[error("Transaction signing failed: {0}")]
    SigningError(String),
    #[error("Slippage tolerance exceeded")]
    SlippageExceeded,
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteParams {
    pub input_mint: String,
    pub output_mint: String,
    /// Smallest units of the input asset
    pub amount: u64,
    pub slippage_bps: u16, // basis points (1 = 0.01%)
}

/// Route descriptor returned by the router. `raw` is handed back verbatim on swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub price_impact_pct: f64,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait RouterPort: Send + Sync {
    async fn quote(&self, params: &QuoteParams) -> Result<RouteQuote, ExecutionError>;

    /// Unsigned serialized transaction for `route`, paid by `signer_pubkey`
    async fn swap_transaction(
        &self,
        route: &RouteQuote,
        signer_pubkey: &str,
        gas: &GasSettings,
    ) -> Result<Vec<u8>, ExecutionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    pub signature: String,
    /// Wire-format bytes ready for submission
    pub wire: Vec<u8>,
}

/// Pins compute budget instructions to `gas` and signs
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> String;

    fn sign(&self, unsigned: &[u8], gas: &GasSettings) -> Result<SignedTransaction, ExecutionError>;
}
