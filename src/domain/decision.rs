//! Decision Policy
//!
//! Pure BUY/SKIP verdict over an aggregated score. Cooldown idempotence is
//! enforced upstream by the cooldown gate, so identical input always yields
//! the identical decision here.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::evaluation::AggregatedScore;

/// Why a candidate was not bought. A deliberate outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    BelowThreshold { composite: f64, threshold: f64 },
    /// NaN or infinite composite, never comparable to the threshold
    NonFiniteScore,
    GateFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BelowThreshold {
                composite,
                threshold,
            } => write!(f, "score {:.2} below threshold {:.2}", composite, threshold),
            SkipReason::NonFiniteScore => write!(f, "composite score is not a finite number"),
            SkipReason::GateFailed(gate) => write!(f, "gate '{}' not satisfied", gate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decision {
    Buy,
    Skip(SkipReason),
}

impl Decision {
    pub fn is_buy(&self) -> bool {
        matches!(self, Decision::Buy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Composite score at or above which a candidate is bought
    pub buy_threshold: f64,
    /// Flags that must all be true, checked in order
    pub mandatory_gates: Vec<String>,
}

impl DecisionPolicy {
    pub fn new(buy_threshold: f64, mandatory_gates: Vec<String>) -> Self {
        Self {
            buy_threshold,
            mandatory_gates,
        }
    }

    pub fn decide(&self, score: &AggregatedScore) -> Decision {
        if !score.composite.is_finite() {
            return Decision::Skip(SkipReason::NonFiniteScore);
        }
        // Incomparable (NaN threshold) counts as below
        if !matches!(
            score.composite.partial_cmp(&self.buy_threshold),
            Some(Ordering::Greater | Ordering::Equal)
        ) {
            return Decision::Skip(SkipReason::BelowThreshold {
                composite: score.composite,
                threshold: self.buy_threshold,
            });
        }

        if let Some(gate) = self.mandatory_gates.iter().find(|g| !score.flag(g)) {
            return Decision::Skip(SkipReason::GateFailed(gate.clone()));
        }

        Decision::Buy
    }
}
