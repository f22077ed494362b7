//! Discord webhook notifier

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::ports::{NotificationPort, PortError, PortResult};

/// Discord rejects message content longer than this
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    http: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> PortResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PortError::Communication(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
        })
    }
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MAX_CONTENT_CHARS {
        return message.to_string();
    }
    let mut out: String = message.chars().take(MAX_CONTENT_CHARS - 1).collect();
    out.push('…');
    out
}

#[async_trait]
impl NotificationPort for DiscordNotifier {
    async fn send(&self, message: &str) -> PortResult<()> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(&serde_json::json!({ "content": truncate(message) }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(match status.as_u16() {
            401 | 403 | 404 => PortError::Authentication(format!("webhook returned {}", status)),
            429 => PortError::RateLimitExceeded,
            _ => PortError::Communication(format!("webhook returned {}", status)),
        })
    }
}
