//! Chain log subscription port
//!
//! A filterable string-log stream per program with explicit unsubscribe,
//! plus the decoder seam that turns a log notification into a swap event.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::models::{Commitment, PortResult};
use crate::domain::SwapEvent;

pub type SubscriptionId = u64;

/// Log marker emitted by AMM programs on a swap instruction
pub const SWAP_LOG_MARKER: &str = "Swap";

/// One transaction's program logs
#[derive(Debug, Clone, PartialEq)]
pub struct LogNotification {
    pub signature: String,
    pub logs: Vec<String>,
    pub slot: u64,
}

impl LogNotification {
    /// True when some line names `pool_id` and some line carries the swap marker
    pub fn is_swap_for_pool(&self, pool_id: &str) -> bool {
        let mentions_pool = self.logs.iter().any(|line| line.contains(pool_id));
        let has_swap = self.logs.iter().any(|line| line.contains(SWAP_LOG_MARKER));
        mentions_pool && has_swap
    }
}

/// An open subscription. Must be released with `unsubscribe(id)`.
#[derive(Debug)]
pub struct LogSubscription {
    pub id: SubscriptionId,
    pub notifications: mpsc::Receiver<LogNotification>,
}

#[async_trait]
pub trait LogSubscriptionPort: Send + Sync {
    async fn subscribe(&self, program_id: &str, commitment: Commitment) -> PortResult<LogSubscription>;

    async fn unsubscribe(&self, id: SubscriptionId) -> PortResult<()>;
}

/// Turns a pre-filtered notification into a structured swap event
pub trait SwapLogDecoder: Send + Sync {
    fn decode(&self, pool_id: &str, notification: &LogNotification) -> Option<SwapEvent>;
}

/// Decoder for pools whose log layout is not known. Yields nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSwapDecoder;

impl SwapLogDecoder for NullSwapDecoder {
    fn decode(&self, _pool_id: &str, _notification: &LogNotification) -> Option<SwapEvent> {
        None
    }
}
