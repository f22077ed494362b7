//! Strategy Layer - Candidate evaluation and scoring
//!
//! - `evaluators`: pluggable evaluators over the analysis ports
//! - `scoring`: pluggable composition of evaluator metrics into a composite score
//! - `aggregator`: concurrent fan-out with per-evaluator timeouts and cooldown dedup

pub mod evaluators;
pub mod scoring;
pub mod aggregator;

pub use evaluators::{
    CredibilityEvaluator, Evaluation, Evaluator, EvaluatorError, SafetyEvaluator,
    TokenAnalysisEvaluator,
};
pub use scoring::{RugPenalties, ScoringStrategy, ScoringWeights, WeightedScoring};
pub use aggregator::SignalAggregator;
