use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::gas::GasSettings;

/// Stages of one trade attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeStage {
    Idle,
    FeeSelection,
    QuoteRequested,
    RouteSigned,
    Submitted,
    Confirmed,
    Failed,
}

impl fmt::Display for TradeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeStage::Idle => "Idle",
            TradeStage::FeeSelection => "FeeSelection",
            TradeStage::QuoteRequested => "QuoteRequested",
            TradeStage::RouteSigned => "RouteSigned",
            TradeStage::Submitted => "Submitted",
            TradeStage::Confirmed => "Confirmed",
            TradeStage::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Terminal failure of a trade attempt, typed by stage
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum TradeFailure {
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Submission timed out: {0}")]
    SubmissionTimeout(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

impl TradeFailure {
    /// Stage the attempt was in when it failed
    pub fn stage(&self) -> TradeStage {
        match self {
            TradeFailure::QuoteUnavailable(_) => TradeStage::QuoteRequested,
            TradeFailure::SigningFailed(_) => TradeStage::RouteSigned,
            TradeFailure::SubmissionTimeout(_) | TradeFailure::Rejected(_) => TradeStage::Submitted,
        }
    }
}

/// Terminal record of a trade attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeOutcome {
    pub token_id: String,
    pub tx_signature: Option<String>,
    pub succeeded: bool,
    pub failure: Option<TradeFailure>,
    pub gas: GasSettings,
    pub timestamp: DateTime<Utc>,
}

impl TradeOutcome {
    pub fn confirmed(token_id: impl Into<String>, signature: impl Into<String>, gas: GasSettings) -> Self {
        Self {
            token_id: token_id.into(),
            tx_signature: Some(signature.into()),
            succeeded: true,
            failure: None,
            gas,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        token_id: impl Into<String>,
        signature: Option<String>,
        failure: TradeFailure,
        gas: GasSettings,
    ) -> Self {
        Self {
            token_id: token_id.into(),
            tx_signature: signature,
            succeeded: false,
            failure: Some(failure),
            gas,
            timestamp: Utc::now(),
        }
    }

    /// Human readable summary for notification sinks
    pub fn message(&self) -> String {
        match (&self.tx_signature, &self.failure) {
            (Some(sig), None) => format!(
                "✅ Bought {}\nTx: {}\nhttps://solscan.io/tx/{}\nGas: {} (max priority fee {} lamports)",
                self.token_id,
                sig,
                sig,
                self.gas,
                self.gas.max_priority_fee_lamports()
            ),
            (sig, Some(failure)) => {
                let mut msg = format!("❌ Trade for {} failed\n{}", self.token_id, failure);
                if let Some(sig) = sig {
                    msg.push_str(&format!("\nTx: {}", sig));
                }
                msg
            }
            (None, None) => format!("Trade for {} ended without a transaction", self.token_id),
        }
    }
}
