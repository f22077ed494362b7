use async_trait::async_trait;

use super::models::PortResult;

/// Outbound message sink (chat push, webhook, log)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn send(&self, message: &str) -> PortResult<()>;
}

/// Send without propagating failure. Errors are logged.
pub async fn notify(port: &dyn NotificationPort, message: &str) {
    if let Err(e) = port.send(message).await {
        tracing::warn!(error = %e, "Notification delivery failed");
    }
}
