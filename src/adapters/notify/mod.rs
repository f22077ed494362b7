//! Notification sinks
//!
//! Telegram and Discord push, a log-only sink, and a fan-out over several.

mod discord;
mod telegram;

pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ports::{NotificationPort, PortResult};

/// Writes notifications to the log. Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationPort for LogNotifier {
    async fn send(&self, message: &str) -> PortResult<()> {
        info!(target: "notification", "{}", message);
        Ok(())
    }
}

/// Sends to every sink concurrently. Individual failures are logged, never returned.
#[derive(Clone, Default)]
pub struct MultiNotifier {
    sinks: Vec<Arc<dyn NotificationPort>>,
}

impl MultiNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationPort>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl NotificationPort for MultiNotifier {
    async fn send(&self, message: &str) -> PortResult<()> {
        let results = join_all(self.sinks.iter().map(|sink| sink.send(message))).await;
        for (idx, result) in results.into_iter().enumerate() {
            if let Err(e) = result {
                warn!(sink = idx, error = %e, "Notification sink failed");
            }
        }
        Ok(())
    }
}
