//! Rug Pull Risk Levels
//!
//! Risk levels reported by token analysis services, normalised from their
//! free-form labels and from numeric 0-100 safety scores.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum safety risk score (0-100) considered safe
pub const DEFAULT_MAX_RISK_SCORE: f64 = 30.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RugDetectorError {
    #[error("Unknown risk level: {0}")]
    UnknownLevel(String),

    #[error("Risk score out of range: {0}")]
    ScoreOutOfRange(f64),
}

/// Risk level for rug pull detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RugPullRisk {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RugPullRisk {
    /// Bucket a 0-100 risk score into a level
    pub fn from_score(score: f64) -> Result<Self, RugDetectorError> {
        if !(0.0..=100.0).contains(&score) {
            return Err(RugDetectorError::ScoreOutOfRange(score));
        }

        Ok(if score == 0.0 {
            RugPullRisk::Safe
        } else if score <= 25.0 {
            RugPullRisk::Low
        } else if score <= 50.0 {
            RugPullRisk::Medium
        } else if score <= 75.0 {
            RugPullRisk::High
        } else {
            RugPullRisk::Critical
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RugPullRisk::Safe => "safe",
            RugPullRisk::Low => "low",
            RugPullRisk::Medium => "medium",
            RugPullRisk::High => "high",
            RugPullRisk::Critical => "critical",
        }
    }
}

impl FromStr for RugPullRisk {
    type Err = RugDetectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" | "none" => Ok(RugPullRisk::Safe),
            "low" => Ok(RugPullRisk::Low),
            "medium" | "moderate" => Ok(RugPullRisk::Medium),
            "high" => Ok(RugPullRisk::High),
            "critical" | "severe" => Ok(RugPullRisk::Critical),
            other => Err(RugDetectorError::UnknownLevel(other.to_string())),
        }
    }
}

impl std::fmt::Display for RugPullRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
