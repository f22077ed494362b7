//! Evaluators
//!
//! Each evaluator produces one signal about a candidate by calling one
//! analysis port, and contributes named boolean gates.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Candidate, MetricValue, Metrics, RugPullRisk};
use crate::ports::{CredibilityPort, PortError, SafetyCheckPort, TokenAnalysisPort};

pub const TOKEN_ANALYSIS: &str = "token_analysis";
pub const SAFETY: &str = "safety";
pub const CREDIBILITY: &str = "credibility";

pub const GATE_LIQUIDITY: &str = "liquidity_above_floor";
pub const GATE_RUG_SAFE: &str = "rug_safe";
pub const GATE_CREDIBILITY: &str = "credibility_above_floor";

pub const METRIC_LIQUIDITY: &str = "liquidity";
pub const METRIC_SMART_MONEY: &str = "smart_money";
pub const METRIC_HOLDERS: &str = "holders";
pub const METRIC_RUG_RISK: &str = "rug_risk";
pub const METRIC_RISK_SCORE: &str = "risk_score";
pub const METRIC_RISK_LEVEL: &str = "risk_level";
pub const METRIC_CREDIBILITY: &str = "credibility";

/// Default minimum pool liquidity (SOL)
pub const DEFAULT_MIN_LIQUIDITY: f64 = 10.0;

/// Default minimum author credibility (0-100)
pub const DEFAULT_MIN_CREDIBILITY: f64 = 50.0;

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Metrics and gate values produced by one evaluator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub metrics: Metrics,
    pub flags: BTreeMap<String, bool>,
}

impl Evaluation {
    fn metric(mut self, name: &str, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(name.to_string(), value.into());
        self
    }

    fn flag(mut self, name: &str, value: bool) -> Self {
        self.flags.insert(name.to_string(), value);
        self
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Gates this evaluator contributes. Forced to false when it fails.
    fn gates(&self) -> &'static [&'static str];

    async fn evaluate(&self, candidate: &Candidate) -> Result<Evaluation, EvaluatorError>;
}

/// Liquidity, smart money, holder count and rug risk of the token
pub struct TokenAnalysisEvaluator {
    port: Arc<dyn TokenAnalysisPort>,
    min_liquidity: f64,
}

impl TokenAnalysisEvaluator {
    pub fn new(port: Arc<dyn TokenAnalysisPort>, min_liquidity: f64) -> Self {
        Self {
            port,
            min_liquidity,
        }
    }
}

#[async_trait]
impl Evaluator for TokenAnalysisEvaluator {
    fn name(&self) -> &'static str {
        TOKEN_ANALYSIS
    }

    fn gates(&self) -> &'static [&'static str] {
        &[GATE_LIQUIDITY]
    }

    async fn evaluate(&self, candidate: &Candidate) -> Result<Evaluation, EvaluatorError> {
        let analysis = self.port.token_analysis(&candidate.token_id).await?;

        if !analysis.liquidity.is_finite() || analysis.liquidity < 0.0 {
            return Err(EvaluatorError::InvalidResponse(format!(
                "liquidity {}",
                analysis.liquidity
            )));
        }

        Ok(Evaluation::default()
            .metric(METRIC_LIQUIDITY, analysis.liquidity)
            .metric(METRIC_SMART_MONEY, analysis.smart_money_activity)
            .metric(METRIC_HOLDERS, analysis.holder_count)
            .metric(METRIC_RUG_RISK, analysis.rug_risk.as_str())
            .flag(GATE_LIQUIDITY, analysis.liquidity >= self.min_liquidity))
    }
}

/// 0-100 rug risk score from a safety service
pub struct SafetyEvaluator {
    port: Arc<dyn SafetyCheckPort>,
    max_risk_score: f64,
}

impl SafetyEvaluator {
    pub fn new(port: Arc<dyn SafetyCheckPort>, max_risk_score: f64) -> Self {
        Self {
            port,
            max_risk_score,
        }
    }
}

#[async_trait]
impl Evaluator for SafetyEvaluator {
    fn name(&self) -> &'static str {
        SAFETY
    }

    fn gates(&self) -> &'static [&'static str] {
        &[GATE_RUG_SAFE]
    }

    async fn evaluate(&self, candidate: &Candidate) -> Result<Evaluation, EvaluatorError> {
        let report = self.port.safety_check(&candidate.token_id).await?;
        let level = RugPullRisk::from_score(report.risk_score)
            .map_err(|e| EvaluatorError::InvalidResponse(e.to_string()))?;

        Ok(Evaluation::default()
            .metric(METRIC_RISK_SCORE, report.risk_score)
            .metric(METRIC_RISK_LEVEL, level.as_str())
            .flag(GATE_RUG_SAFE, report.risk_score <= self.max_risk_score))
    }
}

/// Credibility of the author who mentioned the token
pub struct CredibilityEvaluator {
    port: Arc<dyn CredibilityPort>,
    min_credibility: f64,
}

impl CredibilityEvaluator {
    pub fn new(port: Arc<dyn CredibilityPort>, min_credibility: f64) -> Self {
        Self {
            port,
            min_credibility,
        }
    }
}

#[async_trait]
impl Evaluator for CredibilityEvaluator {
    fn name(&self) -> &'static str {
        CREDIBILITY
    }

    fn gates(&self) -> &'static [&'static str] {
        &[GATE_CREDIBILITY]
    }

    async fn evaluate(&self, candidate: &Candidate) -> Result<Evaluation, EvaluatorError> {
        let report = self.port.credibility(candidate.author_id()).await?;

        if !(0.0..=100.0).contains(&report.score) {
            return Err(EvaluatorError::InvalidResponse(format!(
                "credibility score {}",
                report.score
            )));
        }

        Ok(Evaluation::default()
            .metric(METRIC_CREDIBILITY, report.score)
            .flag(GATE_CREDIBILITY, report.score >= self.min_credibility))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mention;
    use crate::ports::mocks::{MockCredibility, MockSafetyCheck, MockTokenAnalysis};
    use crate::ports::TokenAnalysis;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn candidate() -> Candidate {
        Candidate::from_mention(Mention {
            author_id: "author42".to_string(),
            author_follower_count: 150,
            text: "memecoin".to_string(),
            candidate_token_id: Some("TOKEN".to_string()),
            matched_keywords: BTreeSet::from(["memecoin".to_string()]),
            observed_at: Utc::now(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_token_analysis_metrics_and_gate() {
        let port = Arc::new(MockTokenAnalysis::returning(TokenAnalysis {
            liquidity: 20.0,
            smart_money_activity: 3.0,
            holder_count: 100,
            rug_risk: RugPullRisk::Low,
        }));
        let evaluator = TokenAnalysisEvaluator::new(port.clone(), DEFAULT_MIN_LIQUIDITY);

        let eval = evaluator.evaluate(&candidate()).await.unwrap();
        assert_eq!(eval.metrics[METRIC_LIQUIDITY], MetricValue::Number(20.0));
        assert_eq!(eval.metrics[METRIC_HOLDERS], MetricValue::Number(100.0));
        assert_eq!(eval.metrics[METRIC_RUG_RISK], MetricValue::Level("low".to_string()));
        assert_eq!(eval.flags[GATE_LIQUIDITY], true);
        assert_eq!(port.calls(), vec!["TOKEN".to_string()]);
    }

    #[tokio::test]
    async fn test_token_analysis_rejects_negative_liquidity() {
        let port = Arc::new(MockTokenAnalysis::returning(TokenAnalysis {
            liquidity: -1.0,
            smart_money_activity: 0.0,
            holder_count: 0,
            rug_risk: RugPullRisk::Safe,
        }));
        let evaluator = TokenAnalysisEvaluator::new(port, DEFAULT_MIN_LIQUIDITY);
        assert!(matches!(
            evaluator.evaluate(&candidate()).await,
            Err(EvaluatorError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_safety_gate() {
        let safe = SafetyEvaluator::new(Arc::new(MockSafetyCheck::returning(20.0)), 30.0);
        let eval = safe.evaluate(&candidate()).await.unwrap();
        assert!(eval.flags[GATE_RUG_SAFE]);
        assert_eq!(eval.metrics[METRIC_RISK_LEVEL], MetricValue::Level("low".to_string()));

        let risky = SafetyEvaluator::new(Arc::new(MockSafetyCheck::returning(80.0)), 30.0);
        let eval = risky.evaluate(&candidate()).await.unwrap();
        assert!(!eval.flags[GATE_RUG_SAFE]);
    }

    #[tokio::test]
    async fn test_safety_out_of_range_score() {
        let evaluator = SafetyEvaluator::new(Arc::new(MockSafetyCheck::returning(150.0)), 30.0);
        assert!(evaluator.evaluate(&candidate()).await.is_err());
    }

    #[tokio::test]
    async fn test_credibility_uses_author() {
        let port = Arc::new(MockCredibility::returning(60.0));
        let evaluator = CredibilityEvaluator::new(port.clone(), DEFAULT_MIN_CREDIBILITY);

        let eval = evaluator.evaluate(&candidate()).await.unwrap();
        assert!(eval.flags[GATE_CREDIBILITY]);
        assert_eq!(port.calls(), vec!["author42".to_string()]);
    }

    #[tokio::test]
    async fn test_port_error_propagates() {
        let evaluator = CredibilityEvaluator::new(
            Arc::new(MockCredibility::failing(PortError::Communication("down".into()))),
            DEFAULT_MIN_CREDIBILITY,
        );
        assert!(matches!(
            evaluator.evaluate(&candidate()).await,
            Err(EvaluatorError::Port(PortError::Communication(_)))
        ));
    }
}
