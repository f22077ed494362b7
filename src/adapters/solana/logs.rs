//! Program log subscriptions over the Solana websocket API

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ports::{
    Commitment, LogNotification, LogSubscription, LogSubscriptionPort, PortError, PortResult,
    SubscriptionId,
};
use super::commitment_config;

pub const DEFAULT_LOG_BUFFER: usize = 256;

struct ActiveSubscription {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Log subscription adapter. Each subscription owns a websocket client on its own task.
pub struct SolanaLogStream {
    ws_url: String,
    buffer: usize,
    next_id: AtomicU64,
    active: Mutex<HashMap<SubscriptionId, ActiveSubscription>>,
}

impl SolanaLogStream {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            buffer: DEFAULT_LOG_BUFFER,
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

async fn run_subscription(
    ws_url: String,
    program_id: String,
    commitment: Commitment,
    tx: mpsc::Sender<LogNotification>,
    cancel: CancellationToken,
    ready: oneshot::Sender<PortResult<()>>,
) {
    let client = match PubsubClient::new(&ws_url).await {
        Ok(client) => client,
        Err(e) => {
            let _ = ready.send(Err(PortError::Communication(e.to_string())));
            return;
        }
    };

    let filter = RpcTransactionLogsFilter::Mentions(vec![program_id.clone()]);
    let config = RpcTransactionLogsConfig {
        commitment: Some(commitment_config(commitment)),
    };

    let (mut stream, unsubscribe) = match client.logs_subscribe(filter, config).await {
        Ok(sub) => sub,
        Err(e) => {
            let _ = ready.send(Err(PortError::Protocol(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    info!(program_id = %program_id, "Log subscription open");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            item = stream.next() => {
                let Some(response) = item else {
                    warn!(program_id = %program_id, "Log stream ended");
                    break;
                };
                let notification = LogNotification {
                    signature: response.value.signature,
                    logs: response.value.logs,
                    slot: response.context.slot,
                };
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = tx.send(notification) => {
                        if sent.is_err() {
                            debug!("Log receiver dropped");
                            break;
                        }
                    }
                }
            }
        }
    }

    drop(stream);
    unsubscribe().await;
    if let Err(e) = client.shutdown().await {
        debug!(error = %e, "Websocket shutdown failed");
    }
    info!(program_id = %program_id, "Log subscription closed");
}

#[async_trait]
impl LogSubscriptionPort for SolanaLogStream {
    async fn subscribe(&self, program_id: &str, commitment: Commitment) -> PortResult<LogSubscription> {
        Pubkey::from_str(program_id)
            .map_err(|e| PortError::InvalidInput(format!("program id {}: {}", program_id, e)))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.buffer);
        let (ready_tx, ready_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_subscription(
            self.ws_url.clone(),
            program_id.to_string(),
            commitment,
            tx,
            cancel.clone(),
            ready_tx,
        ));

        ready_rx
            .await
            .map_err(|_| PortError::Communication("subscription task exited".into()))??;

        self.active.lock().insert(id, ActiveSubscription { cancel, task });
        Ok(LogSubscription { id, notifications: rx })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> PortResult<()> {
        let Some(sub) = self.active.lock().remove(&id) else {
            debug!(id, "Unsubscribe for unknown subscription");
            return Ok(());
        };

        sub.cancel.cancel();
        sub.task
            .await
            .map_err(|e| PortError::Communication(format!("Task join error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_program_id_rejected() {
        let stream = SolanaLogStream::new("ws://127.0.0.1:9");
        let err = stream.subscribe("not-a-program", Commitment::Confirmed).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
        assert_eq!(stream.active_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let stream = SolanaLogStream::new("ws://127.0.0.1:9");
        let err = stream
            .subscribe("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", Commitment::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Communication(_)));
        assert_eq!(stream.active_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_unsubscribe_is_noop() {
        let stream = SolanaLogStream::new("ws://127.0.0.1:9").with_buffer(0);
        assert_eq!(stream.buffer, 1);
        assert!(stream.unsubscribe(42).await.is_ok());
    }
}
