//! Risk and analysis ports
//!
//! Each service is independently callable and independently fallible.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::models::PortResult;
use crate::domain::RugPullRisk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAnalysis {
    /// Pool liquidity in SOL
    pub liquidity: f64,
    /// Count of tracked smart-money wallets active in the token
    pub smart_money_activity: f64,
    pub holder_count: u64,
    pub rug_risk: RugPullRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    /// 0 (safe) to 100 (certain rug)
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityReport {
    /// 0 to 100
    pub score: f64,
}

#[async_trait]
pub trait TokenAnalysisPort: Send + Sync {
    async fn token_analysis(&self, token_id: &str) -> PortResult<TokenAnalysis>;
}

#[async_trait]
pub trait SafetyCheckPort: Send + Sync {
    async fn safety_check(&self, token_id: &str) -> PortResult<SafetyReport>;
}

#[async_trait]
pub trait CredibilityPort: Send + Sync {
    async fn credibility(&self, author_id: &str) -> PortResult<CredibilityReport>;
}
