//! Jupiter Swap Types
//!
//! Request and response structures for the Jupiter swap API.

use serde::{Deserialize, Serialize};

use crate::domain::GasSettings;

/// Request parameters for building a swap transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// User's public key (wallet address)
    pub user_public_key: String,
    /// The full quote response from /quote endpoint
    pub quote_response: serde_json::Value,
    /// Wrap SOL input and unwrap SOL output
    pub wrap_and_unwrap_sol: bool,
    /// Compute unit price the router encodes into SetComputeUnitPrice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_unit_price_micro_lamports: Option<u64>,
    /// Let the router simulate and size the compute unit limit
    pub dynamic_compute_unit_limit: bool,
}

impl SwapRequest {
    pub fn new(user_public_key: String, quote_response: serde_json::Value) -> Self {
        Self {
            user_public_key,
            quote_response,
            wrap_and_unwrap_sol: true,
            compute_unit_price_micro_lamports: None,
            dynamic_compute_unit_limit: true,
        }
    }

    /// Pin the compute budget. The signer rewrites the limit, so dynamic sizing is off.
    pub fn with_gas(mut self, gas: &GasSettings) -> Self {
        self.compute_unit_price_micro_lamports = Some(gas.priority_fee_per_unit);
        self.dynamic_compute_unit_limit = false;
        self
    }
}

/// Response from Jupiter swap API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 encoded serialized transaction ready to sign and send
    pub swap_transaction: String,
    /// Last valid block height for this transaction
    pub last_valid_block_height: u64,
    /// Prioritization fee applied (in lamports)
    #[serde(default)]
    pub prioritization_fee_lamports: u64,
}

impl SwapResponse {
    /// Get the transaction bytes from base64
    pub fn transaction_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(&self.swap_transaction)
    }
}
