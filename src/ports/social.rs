use async_trait::async_trait;
use tokio::sync::mpsc;

use super::models::PortResult;
use crate::domain::SocialPost;

/// Keyword-filtered social post stream. Reconnects are the adapter's job;
/// the receiver closes only after `disconnect` or an unrecoverable error.
#[async_trait]
pub trait SocialStreamPort: Send + Sync {
    async fn connect(&self, keyword_rules: &[String]) -> PortResult<mpsc::Receiver<SocialPost>>;

    async fn disconnect(&self) -> PortResult<()>;
}
