//! Telegram Bot API notifier

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::ports::{NotificationPort, PortError, PortResult};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: Client,
    api_base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> PortResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PortError::Communication(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[async_trait]
impl NotificationPort for TelegramNotifier {
    async fn send(&self, message: &str) -> PortResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base_url, self.bot_token);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": message,
            }))
            .send()
            .await?;

        let status = response.status();
        let body: TelegramResponse = response.json().await?;
        if !body.ok {
            let reason = body.description.unwrap_or_else(|| status.to_string());
            return Err(match status.as_u16() {
                401 | 403 => PortError::Authentication(reason),
                429 => PortError::RateLimitExceeded,
                _ => PortError::Rejected(reason),
            });
        }
        Ok(())
    }
}
