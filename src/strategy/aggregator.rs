//! Signal Aggregator
//!
//! Fans a candidate out to every registered evaluator concurrently, each
//! under its own timeout. A failed or slow evaluator degrades to
//! `succeeded: false` with its gates forced closed; it never aborts the
//! siblings or the aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::evaluators::{Evaluator, EvaluatorError};
use super::scoring::ScoringStrategy;
use crate::domain::{AggregatedScore, Candidate, CooldownGate, EvaluationResult};

/// Default per-evaluator timeout
pub const DEFAULT_EVALUATOR_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SignalAggregator {
    evaluators: Vec<Arc<dyn Evaluator>>,
    scoring: Arc<dyn ScoringStrategy>,
    evaluator_timeout: Duration,
    cooldown: Arc<CooldownGate>,
}

impl SignalAggregator {
    pub fn new(
        scoring: Arc<dyn ScoringStrategy>,
        evaluator_timeout: Duration,
        cooldown: Arc<CooldownGate>,
    ) -> Self {
        Self {
            evaluators: Vec::new(),
            scoring,
            evaluator_timeout,
            cooldown,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    pub fn evaluator_names(&self) -> Vec<&'static str> {
        self.evaluators.iter().map(|e| e.name()).collect()
    }

    pub fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    /// Aggregate unless the token is inside its cooldown window.
    /// At most one aggregation per token per window.
    pub async fn evaluate_once(&self, candidate: &Candidate) -> Option<AggregatedScore> {
        if !self.cooldown.try_admit(&candidate.token_id) {
            debug!(
                token = %candidate.token_id,
                remaining = ?self.cooldown.remaining(&candidate.token_id),
                "Candidate cooling down, skipping"
            );
            return None;
        }

        Some(self.evaluate(candidate).await)
    }

    /// Run every evaluator and combine. Always returns a score.
    pub async fn evaluate(&self, candidate: &Candidate) -> AggregatedScore {
        let timeout = self.evaluator_timeout;

        let runs = self.evaluators.iter().map(|evaluator| async move {
            let outcome = match tokio::time::timeout(timeout, evaluator.evaluate(candidate)).await {
                Ok(result) => result,
                Err(_) => Err(EvaluatorError::Timeout(timeout)),
            };
            (Arc::clone(evaluator), outcome)
        });

        let mut results = Vec::with_capacity(self.evaluators.len());
        let mut flags = BTreeMap::new();

        for (evaluator, outcome) in join_all(runs).await {
            let name = evaluator.name();
            match outcome {
                Ok(evaluation) => {
                    let score = self.scoring.component(name, &evaluation.metrics);
                    debug!(token = %candidate.token_id, evaluator = name, score, "Evaluator succeeded");
                    flags.extend(evaluation.flags);
                    results.push(EvaluationResult::success(name, evaluation.metrics, score));
                }
                Err(e) => {
                    warn!(token = %candidate.token_id, evaluator = name, error = %e, "Evaluator failed");
                    for gate in evaluator.gates() {
                        flags.insert(gate.to_string(), false);
                    }
                    results.push(EvaluationResult::failure(name, e.to_string()));
                }
            }
        }

        let composite = self.scoring.composite(&results);
        let aggregated = AggregatedScore {
            token_id: candidate.token_id.clone(),
            results,
            composite,
            flags,
        };

        info!(
            token = %aggregated.token_id,
            composite = aggregated.composite,
            succeeded = aggregated.successes(),
            failed = aggregated.failures(),
            "Candidate scored"
        );
        aggregated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Mention, MetricValue, Metrics, RugPullRisk};
    use crate::ports::mocks::{MockCredibility, MockSafetyCheck, MockTokenAnalysis};
    use crate::ports::{PortError, TokenAnalysis};
    use crate::strategy::evaluators::{
        CredibilityEvaluator, Evaluation, SafetyEvaluator, TokenAnalysisEvaluator, CREDIBILITY,
        GATE_CREDIBILITY, GATE_LIQUIDITY, GATE_RUG_SAFE, SAFETY, TOKEN_ANALYSIS,
    };
    use crate::strategy::scoring::WeightedScoring;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candidate(token: &str) -> Candidate {
        Candidate::from_mention(Mention {
            author_id: "author".to_string(),
            author_follower_count: 150,
            text: format!("memecoin {}", token),
            candidate_token_id: Some(token.to_string()),
            matched_keywords: BTreeSet::from(["memecoin".to_string()]),
            observed_at: Utc::now(),
        })
        .unwrap()
    }

    fn analysis() -> TokenAnalysis {
        TokenAnalysis {
            liquidity: 20.0,
            smart_money_activity: 3.0,
            holder_count: 100,
            rug_risk: RugPullRisk::Low,
        }
    }

    fn aggregator(
        token: MockTokenAnalysis,
        safety: MockSafetyCheck,
        cred: MockCredibility,
    ) -> SignalAggregator {
        SignalAggregator::new(
            Arc::new(WeightedScoring::default()),
            Duration::from_secs(2),
            Arc::new(CooldownGate::new(Duration::from_secs(60))),
        )
        .with_evaluator(Arc::new(TokenAnalysisEvaluator::new(Arc::new(token), 10.0)))
        .with_evaluator(Arc::new(SafetyEvaluator::new(Arc::new(safety), 30.0)))
        .with_evaluator(Arc::new(CredibilityEvaluator::new(Arc::new(cred), 50.0)))
    }

    #[tokio::test]
    async fn test_all_evaluators_succeed() {
        let agg = aggregator(
            MockTokenAnalysis::returning(analysis()),
            MockSafetyCheck::returning(20.0),
            MockCredibility::returning(60.0),
        );

        let score = agg.evaluate(&candidate("TOKEN")).await;
        assert_eq!(score.successes(), 3);
        assert_relative_eq!(score.composite, 75.0);
        assert!(score.flag(GATE_LIQUIDITY));
        assert!(score.flag(GATE_RUG_SAFE));
        assert!(score.flag(GATE_CREDIBILITY));

        let names: Vec<_> = score.results.iter().map(|r| r.evaluator_name.as_str()).collect();
        assert_eq!(names, vec![TOKEN_ANALYSIS, SAFETY, CREDIBILITY]);
        assert_eq!(agg.evaluator_names(), vec![TOKEN_ANALYSIS, SAFETY, CREDIBILITY]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_evaluator_isolated_by_timeout() {
        let agg = aggregator(
            MockTokenAnalysis::returning(analysis()),
            MockSafetyCheck::returning(20.0).with_delay(Duration::from_secs(30)),
            MockCredibility::returning(60.0),
        );

        let score = agg.evaluate(&candidate("TOKEN")).await;
        assert_eq!(score.successes(), 2);
        assert_eq!(score.failures(), 1);

        let safety = score.result(SAFETY).unwrap();
        assert!(!safety.succeeded);
        assert!(safety.failure_reason().unwrap().contains("Timed out"));
        assert!(!score.flag(GATE_RUG_SAFE));
        assert!(score.flag(GATE_CREDIBILITY));
        assert!(score.result(TOKEN_ANALYSIS).unwrap().succeeded);
    }

    #[tokio::test]
    async fn test_failing_evaluator_contributes_zero() {
        let agg = aggregator(
            MockTokenAnalysis::failing(PortError::Communication("503".into())),
            MockSafetyCheck::returning(20.0),
            MockCredibility::returning(60.0),
        );

        let score = agg.evaluate(&candidate("TOKEN")).await;
        assert_eq!(score.failures(), 1);
        assert_relative_eq!(score.composite, 0.0);
        assert!(!score.flag(GATE_LIQUIDITY));
    }

    struct CountingEvaluator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Evaluator for CountingEvaluator {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn gates(&self) -> &'static [&'static str] {
            &[]
        }

        async fn evaluate(&self, _candidate: &Candidate) -> Result<Evaluation, EvaluatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Evaluation {
                metrics: Metrics::from([("n".to_string(), MetricValue::Number(1.0))]),
                flags: BTreeMap::new(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_for_same_token_aggregate_once() {
        let counter = Arc::new(CountingEvaluator {
            calls: AtomicUsize::new(0),
        });
        let agg = Arc::new(
            SignalAggregator::new(
                Arc::new(WeightedScoring::default()),
                Duration::from_secs(2),
                Arc::new(CooldownGate::new(Duration::from_secs(60))),
            )
            .with_evaluator(counter.clone()),
        );

        let c = candidate("TOKEN");
        let (a, b) = tokio::join!(agg.evaluate_once(&c), agg.evaluate_once(&c));

        assert_eq!(a.is_some() as u8 + b.is_some() as u8, 1);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);

        // Different token is unaffected
        assert!(agg.evaluate_once(&candidate("OTHER")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_evaluation_refused_within_cooldown() {
        let agg = aggregator(
            MockTokenAnalysis::returning(analysis()),
            MockSafetyCheck::returning(20.0),
            MockCredibility::returning(60.0),
        );
        let c = candidate("TOKEN");

        assert!(agg.evaluate_once(&c).await.is_some());
        assert!(agg.evaluate_once(&c).await.is_none());
        assert!(agg.cooldown().remaining(&c.token_id).is_some());
    }
}
