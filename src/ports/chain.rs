use async_trait::async_trait;

use super::models::PortResult;

/// Observed state of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Not yet seen at the requested commitment
    Pending,
    Confirmed,
    /// Landed but failed on chain
    Failed(String),
}

/// Chain RPC operations used by the trade coordinator
#[async_trait]
pub trait ChainPort: Send + Sync {
    /// Recent prioritization fees in micro-lamports per compute unit
    async fn recent_priority_fees(&self) -> PortResult<Vec<u64>>;

    /// Broadcast wire bytes, returning the signature
    async fn send_transaction(&self, wire: &[u8]) -> PortResult<String>;

    async fn signature_status(&self, signature: &str) -> PortResult<TxStatus>;
}
