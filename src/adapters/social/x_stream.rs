//! X (Twitter) filtered stream client
//!
//! Installs keyword rules, then reads the newline-delimited JSON stream,
//! joining the `includes.users` expansion onto each post. Reconnects with
//! exponential backoff until `disconnect` is called.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::SocialPost;
use crate::ports::{PortError, PortResult, SocialStreamPort};

pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";

/// Reconnection delay base (exponential backoff)
const RECONNECT_BASE_DELAY_MS: u64 = 1000;
/// Maximum reconnection delay
const MAX_RECONNECT_DELAY_MS: u64 = 30000;
/// Maximum line size in bytes (prevent memory exhaustion)
const MAX_LINE_SIZE: usize = 1_048_576;

const STREAM_QUERY: &[(&str, &str)] = &[
    ("expansions", "author_id"),
    ("tweet.fields", "created_at,author_id"),
    ("user.fields", "public_metrics,username"),
];

#[derive(Debug, Clone)]
pub struct XStreamConfig {
    pub api_base_url: String,
    pub bearer_token: String,
    /// Capacity of the post channel handed to the pipeline
    pub buffer: usize,
    /// Applies to rule installation; the stream itself is long-lived
    pub request_timeout: Duration,
}

impl XStreamConfig {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bearer_token: bearer_token.into(),
            buffer: 256,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    data: Option<TweetData>,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
    username: Option<String>,
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    followers_count: u64,
}

/// Parse one stream line. Keep-alive blanks and non-post frames yield `None`.
pub fn parse_stream_line(line: &str) -> Option<SocialPost> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let envelope: StreamEnvelope = match serde_json::from_str(line) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Skipping unparseable stream frame");
            return None;
        }
    };
    let tweet = envelope.data?;
    let author_id = tweet.author_id?;

    let users: HashMap<&str, &UserData> = envelope
        .includes
        .as_ref()
        .map(|inc| inc.users.iter().map(|u| (u.id.as_str(), u)).collect())
        .unwrap_or_default();
    let author = users.get(author_id.as_str());

    let created_at = tweet
        .created_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(SocialPost {
        post_id: tweet.id,
        text: tweet.text,
        author_username: author.and_then(|u| u.username.clone()),
        author_follower_count: author
            .and_then(|u| u.public_metrics.as_ref())
            .map(|m| m.followers_count)
            .unwrap_or(0),
        author_id,
        created_at,
    })
}

/// Delay before reconnect attempt `attempt` (1-based): 1s doubling, capped at 30s
pub fn reconnect_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(10);
    Duration::from_millis(std::cmp::min(
        RECONNECT_BASE_DELAY_MS * 2u64.pow(exp),
        MAX_RECONNECT_DELAY_MS,
    ))
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct XStreamClient {
    config: XStreamConfig,
    http: Client,
    running: Mutex<Option<Running>>,
}

impl XStreamClient {
    pub fn new(config: XStreamConfig) -> PortResult<Self> {
        // No overall timeout: the stream response stays open indefinitely.
        let http = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| PortError::Communication(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            running: Mutex::new(None),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.running.lock().is_some()
    }

    async fn install_rules(&self, keyword_rules: &[String]) -> PortResult<()> {
        let rules: Vec<_> = keyword_rules
            .iter()
            .map(|rule| serde_json::json!({ "value": rule, "tag": rule }))
            .collect();

        let response = self
            .http
            .post(format!("{}/2/tweets/search/stream/rules", self.config.api_base_url))
            .bearer_auth(&self.config.bearer_token)
            .timeout(self.config.request_timeout)
            .json(&serde_json::json!({ "add": rules }))
            .send()
            .await?;

        check_status(response.status(), "rule installation")?;
        info!(rules = keyword_rules.len(), "Stream rules installed");
        Ok(())
    }
}

fn check_status(status: StatusCode, what: &str) -> PortResult<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(PortError::Authentication(format!("{} returned {}", what, status)))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(PortError::RateLimitExceeded),
        _ => Err(PortError::Communication(format!("{} returned {}", what, status))),
    }
}

/// Read one connection until it ends. Returns true if the receiver went away.
async fn read_stream(
    http: &Client,
    config: &XStreamConfig,
    tx: &mpsc::Sender<SocialPost>,
    cancel: &CancellationToken,
) -> PortResult<bool> {
    let mut response = http
        .get(format!("{}/2/tweets/search/stream", config.api_base_url))
        .bearer_auth(&config.bearer_token)
        .query(STREAM_QUERY)
        .send()
        .await?;
    check_status(response.status(), "stream")?;
    info!("Social stream connected");

    let mut pending: Vec<u8> = Vec::new();
    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => return Ok(false),
            chunk = response.chunk() => chunk?,
        };
        let Some(chunk) = chunk else {
            return Ok(false);
        };

        pending.extend_from_slice(&chunk);
        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            let Some(post) = parse_stream_line(&String::from_utf8_lossy(&line)) else {
                continue;
            };
            tokio::select! {
                _ = cancel.cancelled() => return Ok(false),
                sent = tx.send(post) => {
                    if sent.is_err() {
                        return Ok(true);
                    }
                }
            }
        }

        if pending.len() > MAX_LINE_SIZE {
            warn!(size = pending.len(), "Stream line too large, dropping");
            pending.clear();
        }
    }
}

async fn run_loop(
    http: Client,
    config: XStreamConfig,
    tx: mpsc::Sender<SocialPost>,
    cancel: CancellationToken,
) {
    let mut attempts = 0u32;

    while !cancel.is_cancelled() {
        match read_stream(&http, &config, &tx, &cancel).await {
            Ok(true) => {
                debug!("Post receiver dropped, stopping stream");
                return;
            }
            Ok(false) if cancel.is_cancelled() => return,
            Ok(false) => {
                warn!("Social stream ended");
                attempts = 0;
            }
            Err(e) => error!("Social stream error: {}", e),
        }

        attempts += 1;
        let delay = reconnect_delay(attempts);
        warn!("Reconnecting in {}ms (attempt {})", delay.as_millis(), attempts);

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[async_trait]
impl SocialStreamPort for XStreamClient {
    async fn connect(&self, keyword_rules: &[String]) -> PortResult<mpsc::Receiver<SocialPost>> {
        if self.is_connected() {
            return Err(PortError::InvalidInput("stream already connected".into()));
        }
        if keyword_rules.is_empty() {
            return Err(PortError::InvalidInput("at least one keyword rule is required".into()));
        }

        self.install_rules(keyword_rules).await?;

        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            self.http.clone(),
            self.config.clone(),
            tx,
            cancel.clone(),
        ));

        *self.running.lock() = Some(Running { cancel, task });
        Ok(rx)
    }

    async fn disconnect(&self) -> PortResult<()> {
        let Some(running) = self.running.lock().take() else {
            return Ok(());
        };

        running.cancel.cancel();
        running
            .task
            .await
            .map_err(|e| PortError::Communication(format!("Task join error: {}", e)))?;
        info!("Social stream disconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_http::serve;

    const LINE: &str = r#"{"data":{"id":"1","text":"buy ABCxyz1234567892abcdefghijkmnopqrstuvwxyzABC now","author_id":"42","created_at":"2024-05-01T12:00:00.000Z"},"includes":{"users":[{"id":"42","username":"caller","public_metrics":{"followers_count":1500}}]}}"#;

    fn config(base: String) -> XStreamConfig {
        XStreamConfig {
            api_base_url: base,
            ..XStreamConfig::new("token")
        }
    }

    #[test]
    fn test_parse_joins_author_expansion() {
        let post = parse_stream_line(LINE).unwrap();
        assert_eq!(post.post_id, "1");
        assert_eq!(post.author_id, "42");
        assert_eq!(post.author_username.as_deref(), Some("caller"));
        assert_eq!(post.author_follower_count, 1500);
        assert_eq!(post.created_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_parse_missing_user_reads_zero_followers() {
        let line = r#"{"data":{"id":"2","text":"hi","author_id":"7"}}"#;
        let post = parse_stream_line(line).unwrap();
        assert_eq!(post.author_follower_count, 0);
        assert!(post.author_username.is_none());
    }

    #[test]
    fn test_parse_skips_keepalive_and_garbage() {
        assert!(parse_stream_line("").is_none());
        assert!(parse_stream_line("\r\n").is_none());
        assert!(parse_stream_line("{not json").is_none());
        assert!(parse_stream_line(r#"{"errors":[{"title":"ConnectionException"}]}"#).is_none());
    }

    #[test]
    fn test_reconnect_delay_doubles_and_caps() {
        assert_eq!(reconnect_delay(1), Duration::from_secs(1));
        assert_eq!(reconnect_delay(2), Duration::from_secs(2));
        assert_eq!(reconnect_delay(5), Duration::from_secs(16));
        assert_eq!(reconnect_delay(6), Duration::from_secs(30));
        assert_eq!(reconnect_delay(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_connect_requires_rules() {
        let client = XStreamClient::new(XStreamConfig::new("token")).unwrap();
        assert!(matches!(client.connect(&[]).await, Err(PortError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_rule_install_auth_failure() {
        let (base, _) = serve(vec![(401, "{}".to_string())]).await;
        let client = XStreamClient::new(config(base)).unwrap();

        let err = client.connect(&["pump".to_string()]).await.unwrap_err();
        assert!(matches!(err, PortError::Authentication(_)));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_stream_delivers_posts() {
        let body = format!("{}\r\n\r\n", LINE);
        let (base, seen) = serve(vec![(201, "{}".to_string()), (200, body)]).await;
        let client = XStreamClient::new(config(base)).unwrap();

        let mut rx = client.connect(&["pump".to_string()]).await.unwrap();
        let post = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.author_follower_count, 1500);

        client.disconnect().await.unwrap();
        assert!(!client.is_connected());

        let requests = seen.lock();
        assert!(requests[0].starts_with("POST /2/tweets/search/stream/rules"));
        assert!(requests[0].contains("\"value\":\"pump\""));
        assert!(requests[1].starts_with("GET /2/tweets/search/stream?"));
        assert!(requests[1].to_lowercase().contains("authorization: bearer token"));
    }

    #[tokio::test]
    async fn test_disconnect_with_full_buffer_does_not_hang() {
        let body = format!("{}\r\n", LINE).repeat(300);
        let (base, _) = serve(vec![(201, "{}".to_string()), (200, body)]).await;
        let client = XStreamClient::new(XStreamConfig {
            buffer: 8,
            ..config(base)
        })
        .unwrap();

        // Receiver is held but never read, so the reader fills the channel
        let rx = client.connect(&["pump".to_string()]).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while rx.capacity() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        tokio::time::timeout(Duration::from_secs(3), client.disconnect())
            .await
            .unwrap()
            .unwrap();
        assert!(!client.is_connected());
        drop(rx);
    }
}
