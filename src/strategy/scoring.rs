//! Scoring Strategies
//!
//! Turn evaluator metrics into score components and combine them into the
//! composite the decision policy compares against its threshold. The
//! weights are policy; swap the strategy to change them.

use serde::{Deserialize, Serialize};

use super::evaluators::{
    CREDIBILITY, METRIC_CREDIBILITY, METRIC_HOLDERS, METRIC_LIQUIDITY, METRIC_RISK_SCORE,
    METRIC_RUG_RISK, METRIC_SMART_MONEY, SAFETY, TOKEN_ANALYSIS,
};
use crate::domain::{EvaluationResult, Metrics, RugPullRisk};

pub trait ScoringStrategy: Send + Sync {
    /// Score component for one successful evaluator
    fn component(&self, evaluator_name: &str, metrics: &Metrics) -> f64;

    /// Composite over all results. Failed evaluators contribute nothing.
    fn composite(&self, results: &[EvaluationResult]) -> f64 {
        results.iter().map(|r| r.score()).sum()
    }
}

/// Rug risk penalty per level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RugPenalties {
    pub safe: f64,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RugPenalties {
    fn default() -> Self {
        Self {
            safe: 0.0,
            low: 5.0,
            medium: 25.0,
            high: 50.0,
            critical: 100.0,
        }
    }
}

impl RugPenalties {
    pub fn for_level(&self, level: RugPullRisk) -> f64 {
        match level {
            RugPullRisk::Safe => self.safe,
            RugPullRisk::Low => self.low,
            RugPullRisk::Medium => self.medium,
            RugPullRisk::High => self.high,
            RugPullRisk::Critical => self.critical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Liquidity (SOL) at which the full liquidity points are awarded
    pub liquidity_full_at: f64,
    pub liquidity_points: f64,
    /// Points per SOL below `liquidity_full_at`
    pub liquidity_per_unit: f64,
    pub smart_money_per_wallet: f64,
    pub smart_money_cap: f64,
    pub holders_full_at: u64,
    pub holders_points: f64,
    /// Holders per point below `holders_full_at`
    pub holders_per_point: f64,
    pub rug_penalties: RugPenalties,
    /// Penalty per point of safety risk score
    pub safety_weight: f64,
    /// Points per point of author credibility
    pub credibility_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            liquidity_full_at: 10.0,
            liquidity_points: 30.0,
            liquidity_per_unit: 3.0,
            smart_money_per_wallet: 10.0,
            smart_money_cap: 30.0,
            holders_full_at: 100,
            holders_points: 20.0,
            holders_per_point: 5.0,
            rug_penalties: RugPenalties::default(),
            safety_weight: 0.0,
            credibility_weight: 0.0,
        }
    }
}

/// liquidity + smart money + holders - rug penalty, with optional
/// safety and credibility terms
#[derive(Debug, Clone, Default)]
pub struct WeightedScoring {
    weights: ScoringWeights,
}

impl WeightedScoring {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    fn token_analysis(&self, metrics: &Metrics) -> f64 {
        let w = &self.weights;
        let number = |name: &str| metrics.get(name).and_then(|v| v.as_f64()).unwrap_or(0.0);

        let liquidity = number(METRIC_LIQUIDITY);
        let liquidity_score = if liquidity >= w.liquidity_full_at {
            w.liquidity_points
        } else {
            liquidity * w.liquidity_per_unit
        };

        let smart_money_score =
            (number(METRIC_SMART_MONEY) * w.smart_money_per_wallet).min(w.smart_money_cap);

        let holders = number(METRIC_HOLDERS);
        let holders_score = if holders >= w.holders_full_at as f64 {
            w.holders_points
        } else if w.holders_per_point > 0.0 {
            holders / w.holders_per_point
        } else {
            0.0
        };

        // Unknown risk level is penalised as critical
        let rug_penalty = metrics
            .get(METRIC_RUG_RISK)
            .and_then(|v| v.as_level())
            .and_then(|s| s.parse::<RugPullRisk>().ok())
            .map(|level| w.rug_penalties.for_level(level))
            .unwrap_or(w.rug_penalties.critical);

        liquidity_score + smart_money_score + holders_score - rug_penalty
    }
}

impl ScoringStrategy for WeightedScoring {
    fn component(&self, evaluator_name: &str, metrics: &Metrics) -> f64 {
        let metric = |name: &str| metrics.get(name).and_then(|v| v.as_f64()).unwrap_or(0.0);

        match evaluator_name {
            TOKEN_ANALYSIS => self.token_analysis(metrics),
            SAFETY => -metric(METRIC_RISK_SCORE) * self.weights.safety_weight,
            CREDIBILITY => metric(METRIC_CREDIBILITY) * self.weights.credibility_weight,
            _ => 0.0,
        }
    }
}
