//! Jupiter Quote Types
//!
//! Request and response structures for the Jupiter quote API.

use serde::{Deserialize, Serialize};

use crate::ports::{ExecutionError, RouteQuote};

/// Request parameters for getting a swap quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Amount in base units (lamports for SOL)
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// Only use direct routes (no intermediate tokens)
    #[serde(default)]
    pub only_direct_routes: bool,
}

impl QuoteRequest {
    /// Create a new quote request with required parameters
    pub fn new(input_mint: String, output_mint: String, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            slippage_bps,
            only_direct_routes: false,
        }
    }

    /// Set only direct routes flag
    pub fn with_direct_routes(mut self, direct: bool) -> Self {
        self.only_direct_routes = direct;
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("inputMint", self.input_mint.clone()),
            ("outputMint", self.output_mint.clone()),
            ("amount", self.amount.to_string()),
            ("slippageBps", self.slippage_bps.to_string()),
        ];
        if self.only_direct_routes {
            pairs.push(("onlyDirectRoutes", "true".to_string()));
        }
        pairs
    }
}

/// Response from Jupiter quote API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage
    pub other_amount_threshold: String,
    pub swap_mode: String,
    pub slippage_bps: u16,
    /// Price impact percentage (as string)
    #[serde(default)]
    pub price_impact_pct: String,
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    pub context_slot: Option<u64>,
    /// Fields the swap endpoint expects back untouched
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    pub fn input_amount(&self) -> u64 {
        self.in_amount.parse().unwrap_or(0)
    }

    pub fn output_amount(&self) -> u64 {
        self.out_amount.parse().unwrap_or(0)
    }

    /// Get price impact as f64 percentage
    pub fn price_impact(&self) -> f64 {
        self.price_impact_pct.parse().unwrap_or(0.0)
    }

    /// DEX labels along the route
    pub fn venues(&self) -> Vec<&str> {
        self.route_plan
            .iter()
            .map(|step| step.swap_info.label.as_str())
            .collect()
    }

    /// Convert into the router-agnostic descriptor, keeping the raw JSON for /swap
    pub fn into_route(self) -> Result<RouteQuote, ExecutionError> {
        if self.route_plan.is_empty() {
            return Err(ExecutionError::NoRoute(format!(
                "{} -> {}",
                self.input_mint, self.output_mint
            )));
        }

        let raw = serde_json::to_value(&self)
            .map_err(|e| ExecutionError::ApiError(format!("Failed to encode quote: {}", e)))?;

        Ok(RouteQuote {
            in_amount: self.input_amount(),
            out_amount: self.output_amount(),
            price_impact_pct: self.price_impact(),
            input_mint: self.input_mint,
            output_mint: self.output_mint,
            raw,
        })
    }
}

/// A step in the route plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    /// Percentage of the trade going through this route
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    /// AMM key (pool identifier)
    pub amm_key: String,
    /// Label for the DEX (e.g., "Raydium", "Orca")
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_mint: Option<String>,
}
