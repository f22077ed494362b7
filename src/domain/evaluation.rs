//! Evaluation results
//!
//! Per-evaluator results and the aggregated score built from them. An
//! aggregated score is recomputed fresh for every candidate.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A single metric reported by an evaluator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Level(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Level(_) => None,
        }
    }

    pub fn as_level(&self) -> Option<&str> {
        match self {
            MetricValue::Level(s) => Some(s),
            MetricValue::Number(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Number(value as f64)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Level(value.to_string())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Level(s) => f.write_str(s),
        }
    }
}

pub type Metrics = BTreeMap<String, MetricValue>;

/// Score component or failure reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScoreOutcome {
    Score(f64),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub evaluator_name: String,
    pub succeeded: bool,
    pub metrics: Metrics,
    pub outcome: ScoreOutcome,
}

impl EvaluationResult {
    pub fn success(name: impl Into<String>, metrics: Metrics, score: f64) -> Self {
        Self {
            evaluator_name: name.into(),
            succeeded: true,
            metrics,
            outcome: ScoreOutcome::Score(score),
        }
    }

    pub fn failure(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            evaluator_name: name.into(),
            succeeded: false,
            metrics: Metrics::new(),
            outcome: ScoreOutcome::Failed(reason.into()),
        }
    }

    /// Contribution to the composite. Failed evaluators contribute nothing.
    pub fn score(&self) -> f64 {
        match self.outcome {
            ScoreOutcome::Score(s) if self.succeeded => s,
            _ => 0.0,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            ScoreOutcome::Failed(reason) => Some(reason),
            ScoreOutcome::Score(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedScore {
    pub token_id: String,
    /// In evaluator registration order
    pub results: Vec<EvaluationResult>,
    pub composite: f64,
    pub flags: BTreeMap<String, bool>,
}

impl AggregatedScore {
    /// Gate value. Unknown gates read as false.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    pub fn failures(&self) -> usize {
        self.results.len() - self.successes()
    }

    pub fn result(&self, evaluator_name: &str) -> Option<&EvaluationResult> {
        self.results
            .iter()
            .find(|r| r.evaluator_name == evaluator_name)
    }
}
