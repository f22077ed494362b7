//! Analysis Service Client
//!
//! Fetches token analysis, safety reports and author credibility from HTTP
//! JSON services addressed by URL templates containing `{id}`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::ports::{
    CredibilityPort, CredibilityReport, PortError, PortResult, SafetyCheckPort, SafetyReport,
    TokenAnalysis, TokenAnalysisPort,
};

/// Placeholder replaced by the token or author id
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// e.g. `https://analysis.example/tokens/{id}`
    pub token_analysis_url: String,
    pub safety_url: String,
    pub credibility_url: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// One client for all three analysis services
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    config: AnalysisConfig,
    http: Client,
}

impl AnalysisClient {
    pub fn new(config: AnalysisConfig) -> PortResult<Self> {
        for template in [
            &config.token_analysis_url,
            &config.safety_url,
            &config.credibility_url,
        ] {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(PortError::InvalidInput(format!(
                    "URL template '{}' lacks {}",
                    template, ID_PLACEHOLDER
                )));
            }
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortError::Communication(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    async fn fetch<T: DeserializeOwned>(&self, template: &str, id: &str) -> PortResult<T> {
        if id.is_empty() {
            return Err(PortError::InvalidInput("empty id".into()));
        }

        let url = template.replace(ID_PLACEHOLDER, id);
        let mut req = self.http.get(&url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = req.send().await?;
        let status = response.status();
        match status {
            s if s.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(PortError::RateLimitExceeded),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(PortError::Authentication(format!("{} returned {}", url, status)))
            }
            StatusCode::NOT_FOUND => {
                return Err(PortError::Rejected(format!("{} not known to analysis service", id)))
            }
            _ => return Err(PortError::Communication(format!("{} returned {}", url, status))),
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn check_percent(what: &str, value: f64) -> PortResult<f64> {
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(PortError::Protocol(format!("{} {} outside 0..=100", what, value)))
    }
}

#[async_trait]
impl TokenAnalysisPort for AnalysisClient {
    async fn token_analysis(&self, token_id: &str) -> PortResult<TokenAnalysis> {
        let analysis: TokenAnalysis = self.fetch(&self.config.token_analysis_url, token_id).await?;
        if analysis.liquidity < 0.0 || analysis.smart_money_activity < 0.0 {
            return Err(PortError::Protocol("negative liquidity or activity".into()));
        }
        Ok(analysis)
    }
}

#[async_trait]
impl SafetyCheckPort for AnalysisClient {
    async fn safety_check(&self, token_id: &str) -> PortResult<SafetyReport> {
        let report: SafetyReport = self.fetch(&self.config.safety_url, token_id).await?;
        check_percent("risk score", report.risk_score)?;
        Ok(report)
    }
}

#[async_trait]
impl CredibilityPort for AnalysisClient {
    async fn credibility(&self, author_id: &str) -> PortResult<CredibilityReport> {
        let report: CredibilityReport = self.fetch(&self.config.credibility_url, author_id).await?;
        check_percent("credibility", report.score)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_http::serve;
    use crate::domain::RugPullRisk;

    const TOKEN: &str = "ABCxyz1234567892abcdefghijkmnopqrstuvwxyzABC";

    fn config(base: &str) -> AnalysisConfig {
        AnalysisConfig {
            token_analysis_url: format!("{}/tokens/{{id}}", base),
            safety_url: format!("{}/safety/{{id}}", base),
            credibility_url: format!("{}/authors/{{id}}/credibility", base),
            api_key: Some("k".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let mut cfg = config("http://localhost");
        cfg.safety_url = "http://localhost/safety".to_string();
        assert!(matches!(AnalysisClient::new(cfg), Err(PortError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_token_analysis_fetch() {
        let body = r#"{"liquidity":12.5,"smart_money_activity":3,"holder_count":250,"rug_risk":"low"}"#;
        let (base, seen) = serve(vec![(200, body.to_string())]).await;
        let client = AnalysisClient::new(config(&base)).unwrap();

        let analysis = client.token_analysis(TOKEN).await.unwrap();
        assert_eq!(analysis.holder_count, 250);
        assert_eq!(analysis.rug_risk, RugPullRisk::Low);

        let request = seen.lock()[0].clone();
        assert!(request.starts_with(&format!("GET /tokens/{} ", TOKEN)));
        assert!(request.to_lowercase().contains("x-api-key: k"));
    }

    #[tokio::test]
    async fn test_credibility_path_uses_author_id() {
        let (base, seen) = serve(vec![(200, r#"{"score":64}"#.to_string())]).await;
        let client = AnalysisClient::new(config(&base)).unwrap();

        let report = client.credibility("42").await.unwrap();
        assert!((report.score - 64.0).abs() < f64::EPSILON);
        assert!(seen.lock()[0].starts_with("GET /authors/42/credibility "));
    }

    #[tokio::test]
    async fn test_out_of_range_risk_is_protocol_error() {
        let (base, _) = serve(vec![(200, r#"{"risk_score":140}"#.to_string())]).await;
        let client = AnalysisClient::new(config(&base)).unwrap();

        assert!(matches!(
            client.safety_check(TOKEN).await,
            Err(PortError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (base, _) = serve(vec![
            (429, "{}".to_string()),
            (404, "{}".to_string()),
            (500, "{}".to_string()),
        ])
        .await;
        let client = AnalysisClient::new(config(&base)).unwrap();

        assert_eq!(client.safety_check(TOKEN).await, Err(PortError::RateLimitExceeded));
        assert!(matches!(client.safety_check(TOKEN).await, Err(PortError::Rejected(_))));
        assert!(matches!(client.safety_check(TOKEN).await, Err(PortError::Communication(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_serialization_error() {
        let (base, _) = serve(vec![(200, "not json".to_string())]).await;
        let client = AnalysisClient::new(config(&base)).unwrap();

        assert!(matches!(
            client.credibility("42").await,
            Err(PortError::Serialization(_))
        ));
    }
}
