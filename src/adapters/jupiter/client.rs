//! Jupiter API Client
//!
//! HTTP client for the Jupiter swap API.
//! Fetches route quotes and builds unsigned swap transactions.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::GasSettings;
use crate::ports::execution::{ExecutionError, QuoteParams, RouteQuote, RouterPort};
use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};

pub const DEFAULT_API_BASE_URL: &str = "https://api.jup.ag/swap/v1";

/// Jupiter API client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for Jupiter API
    pub api_base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Number of attempts per request
    pub max_retries: u32,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

/// Jupiter DEX aggregator client
#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    /// Create a new Jupiter client with custom configuration
    pub fn with_config(config: JupiterConfig) -> Result<Self, ExecutionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Get a quote for a token swap
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ExecutionError> {
        let url = format!("{}/quote", self.config.api_base_url);

        let mut req = self.http.get(&url).query(&request.query_pairs());

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = self.execute_with_retry(|| async {
            req.try_clone()
                .ok_or_else(|| ExecutionError::ApiError("Failed to clone request".into()))?
                .send()
                .await
                .map_err(send_error)
        }).await?;

        self.handle_response(response).await
    }

    /// Build and get swap transaction
    pub async fn get_swap_transaction(
        &self,
        request: &SwapRequest,
    ) -> Result<SwapResponse, ExecutionError> {
        let url = format!("{}/swap", self.config.api_base_url);

        let mut req = self.http.post(&url).json(request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = self.execute_with_retry(|| async {
            req.try_clone()
                .ok_or_else(|| ExecutionError::ApiError("Failed to clone request".into()))?
                .send()
                .await
                .map_err(send_error)
        }).await?;

        self.handle_response(response).await
    }

    /// Execute request with retry logic and rate limit handling
    async fn execute_with_retry<F, Fut>(&self, request_fn: F) -> Result<reqwest::Response, ExecutionError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, ExecutionError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            match request_fn().await {
                Ok(response) => {
                    // Handle rate limiting (429) with exponential backoff
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1)); // 2s, 4s, 8s
                        tracing::warn!(
                            "Rate limited (429), backing off for {:?} (attempt {}/{})",
                            backoff, attempt + 1, self.config.max_retries
                        );
                        last_error = Some(ExecutionError::ApiError("Rate limit exceeded".into()));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    // Retry on server errors (5xx)
                    if response.status().is_server_error() {
                        last_error = Some(ExecutionError::ApiError(
                            format!("Server error: {}", response.status())
                        ));
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                        continue;
                    }

                    return Ok(response);
                }
                // A timed-out attempt already spent the budget; surface it.
                Err(e @ ExecutionError::Timeout(_)) => return Err(e),
                Err(e) => {
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ExecutionError::ApiError("Max retries exceeded".into())))
    }

    /// Handle API response and deserialize
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ExecutionError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

fn send_error(e: reqwest::Error) -> ExecutionError {
    if e.is_timeout() {
        ExecutionError::Timeout(e.to_string())
    } else {
        ExecutionError::ApiError(e.to_string())
    }
}

fn classify_error(status: StatusCode, body: &str) -> ExecutionError {
    if body.contains("SlippageToleranceExceeded") || body.contains("6001") {
        return ExecutionError::SlippageExceeded;
    }

    if body.contains("COULD_NOT_FIND_ANY_ROUTE")
        || body.contains("NO_ROUTES_FOUND")
        || body.contains("Could not find any route")
    {
        return ExecutionError::NoRoute(body.to_string());
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return ExecutionError::ApiError("Rate limit exceeded".into());
    }

    ExecutionError::ApiError(format!("API error {}: {}", status, body))
}

#[async_trait]
impl RouterPort for JupiterClient {
    async fn quote(&self, params: &QuoteParams) -> Result<RouteQuote, ExecutionError> {
        if params.amount == 0 {
            return Err(ExecutionError::InvalidParameters("amount must be positive".into()));
        }

        let request = QuoteRequest::new(
            params.input_mint.clone(),
            params.output_mint.clone(),
            params.amount,
            params.slippage_bps,
        );

        let quote = self.get_quote(&request).await?;
        tracing::debug!(
            output_mint = %quote.output_mint,
            out_amount = %quote.out_amount,
            venues = ?quote.venues(),
            "Jupiter quote received"
        );
        quote.into_route()
    }

    async fn swap_transaction(
        &self,
        route: &RouteQuote,
        signer_pubkey: &str,
        gas: &GasSettings,
    ) -> Result<Vec<u8>, ExecutionError> {
        let request = SwapRequest::new(signer_pubkey.to_string(), route.raw.clone()).with_gas(gas);

        let swap = self.get_swap_transaction(&request).await?;

        swap.transaction_bytes()
            .map_err(|e| ExecutionError::ApiError(format!("Invalid swap transaction encoding: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_http::serve;

    fn client_for(base: String) -> JupiterClient {
        JupiterClient::with_config(JupiterConfig {
            api_base_url: base,
            api_key: Some("test-key".to_string()),
            timeout: Duration::from_secs(5),
            max_retries: 2,
        })
        .unwrap()
    }

    fn params() -> QuoteParams {
        QuoteParams {
            input_mint: "So11111111111111111111111111111111111111112".to_string(),
            output_mint: "ABCxyz1234567892abcdefghijkmnopqrstuvwxyzABC".to_string(),
            amount: 100_000_000,
            slippage_bps: 100,
        }
    }

    const QUOTE_BODY: &str = r#"{
        "inputMint": "So11111111111111111111111111111111111111112",
        "outputMint": "ABCxyz1234567892abcdefghijkmnopqrstuvwxyzABC",
        "inAmount": "100000000",
        "outAmount": "4200000000",
        "otherAmountThreshold": "4158000000",
        "swapMode": "ExactIn",
        "slippageBps": 100,
        "priceImpactPct": "0.1",
        "routePlan": [{
            "swapInfo": {
                "ammKey": "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2",
                "label": "Raydium",
                "inputMint": "So11111111111111111111111111111111111111112",
                "outputMint": "ABCxyz1234567892abcdefghijkmnopqrstuvwxyzABC",
                "inAmount": "100000000",
                "outAmount": "4200000000"
            },
            "percent": 100
        }]
    }"#;

    #[test]
    fn test_jupiter_config_default() {
        let config = JupiterConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.api_key.is_none());
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_jupiter_client_creation() {
        let client = JupiterClient::with_config(JupiterConfig::default()).unwrap();
        assert_eq!(client.config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            classify_error(StatusCode::BAD_REQUEST, r#"{"error":"SlippageToleranceExceeded"}"#),
            ExecutionError::SlippageExceeded
        );
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, r#"{"errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#),
            ExecutionError::NoRoute(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, "bad key"),
            ExecutionError::ApiError(msg) if msg.contains("401")
        ));
    }

    #[tokio::test]
    async fn test_quote_against_local_server() {
        let (base, _) = serve(vec![(200, QUOTE_BODY.to_string())]).await;
        let client = client_for(base);

        let route = client.quote(&params()).await.unwrap();
        assert_eq!(route.in_amount, 100_000_000);
        assert_eq!(route.out_amount, 4_200_000_000);
        assert_eq!(route.raw["routePlan"][0]["swapInfo"]["label"], "Raydium");
    }

    #[tokio::test]
    async fn test_quote_no_route() {
        let body = r#"{"error":"Could not find any route","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#;
        let (base, _) = serve(vec![(400, body.to_string())]).await;
        let client = client_for(base);

        let err = client.quote(&params()).await.unwrap_err();
        assert!(matches!(err, ExecutionError::NoRoute(_)));
    }

    #[tokio::test]
    async fn test_quote_retries_server_error() {
        let (base, _) = serve(vec![
            (503, "{}".to_string()),
            (200, QUOTE_BODY.to_string()),
        ]).await;
        let client = client_for(base);

        let route = client.quote(&params()).await.unwrap();
        assert_eq!(route.out_amount, 4_200_000_000);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_locally() {
        let client = client_for("http://127.0.0.1:9".to_string());
        let mut p = params();
        p.amount = 0;
        assert!(matches!(
            client.quote(&p).await,
            Err(ExecutionError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_swap_transaction_decodes_base64() {
        let body = r#"{"swapTransaction":"AQID","lastValidBlockHeight":10}"#;
        let (base, _) = serve(vec![(200, body.to_string())]).await;
        let client = client_for(base);

        let route: QuoteResponse = serde_json::from_str(QUOTE_BODY).unwrap();
        let route = route.into_route().unwrap();
        let bytes = client
            .swap_transaction(&route, "wallet", &GasSettings::new(200_000, 10_000))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
