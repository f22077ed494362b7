use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::ports::{ChainPort, Commitment, PortError, PortResult, TxStatus};
use super::commitment_config;

#[derive(Debug, Error)]
pub enum SolanaClientError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("RPC request timed out: {0}")]
    Timeout(String),
    #[error("Transaction failed: {0}")]
    TransactionError(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid transaction bytes: {0}")]
    InvalidTransaction(String),
}

impl From<ClientError> for SolanaClientError {
    fn from(err: ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::Reqwest(e) if e.is_timeout() => SolanaClientError::Timeout(err.to_string()),
            ClientErrorKind::RpcError(_) | ClientErrorKind::TransactionError(_) => {
                SolanaClientError::TransactionError(err.to_string())
            }
            _ => SolanaClientError::RpcError(err.to_string()),
        }
    }
}

impl From<SolanaClientError> for PortError {
    fn from(err: SolanaClientError) -> Self {
        match err {
            SolanaClientError::RpcError(msg) => PortError::Communication(msg),
            SolanaClientError::Timeout(msg) => PortError::Timeout(msg),
            SolanaClientError::TransactionError(msg) => PortError::Rejected(msg),
            SolanaClientError::InvalidSignature(msg)
            | SolanaClientError::InvalidPublicKey(msg)
            | SolanaClientError::InvalidTransaction(msg) => PortError::InvalidInput(msg),
        }
    }
}

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
    /// Accounts whose recent write-lock fees drive the priority fee estimate
    fee_accounts: Vec<Pubkey>,
}

impl SolanaClient {
    /// Create a new Solana RPC client
    pub fn new(rpc_url: String, commitment: Commitment) -> Self {
        let commitment = commitment_config(commitment);
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, commitment));
        Self {
            client,
            commitment,
            fee_accounts: Vec::new(),
        }
    }

    /// Sample priority fees from transactions touching these accounts
    pub fn with_fee_accounts(mut self, accounts: &[String]) -> Result<Self, SolanaClientError> {
        self.fee_accounts = accounts
            .iter()
            .map(|a| Pubkey::from_str(a).map_err(|e| SolanaClientError::InvalidPublicKey(e.to_string())))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Get SOL balance for a public key
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, SolanaClientError> {
        let pubkey = Pubkey::from_str(pubkey)
            .map_err(|e| SolanaClientError::InvalidPublicKey(e.to_string()))?;

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || client.get_balance(&pubkey).map_err(SolanaClientError::from))
            .await
            .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Recent prioritization fees, micro-lamports per compute unit
    pub async fn get_recent_prioritization_fees(&self) -> Result<Vec<u64>, SolanaClientError> {
        let client = Arc::clone(&self.client);
        let accounts = self.fee_accounts.clone();
        tokio::task::spawn_blocking(move || {
            client
                .get_recent_prioritization_fees(&accounts)
                .map(|fees| fees.into_iter().map(|f| f.prioritization_fee).collect())
                .map_err(SolanaClientError::from)
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Send a signed transaction in wire format to the network
    pub async fn send_wire_transaction(&self, wire: &[u8]) -> Result<String, SolanaClientError> {
        let tx: VersionedTransaction = bincode::deserialize(wire)
            .map_err(|e| SolanaClientError::InvalidTransaction(e.to_string()))?;
        let client = Arc::clone(&self.client);

        tokio::task::spawn_blocking(move || {
            client
                .send_transaction(&tx)
                .map(|sig| sig.to_string())
                .map_err(SolanaClientError::from)
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Look up a signature at the client's commitment level
    pub async fn get_signature_status(&self, signature_str: &str) -> Result<TxStatus, SolanaClientError> {
        let signature = Signature::from_str(signature_str)
            .map_err(|e| SolanaClientError::InvalidSignature(e.to_string()))?;

        let client = Arc::clone(&self.client);
        let commitment = self.commitment;
        tokio::task::spawn_blocking(move || {
            let response = client
                .get_signature_statuses(&[signature])
                .map_err(SolanaClientError::from)?;

            let status = match response.value.into_iter().next().flatten() {
                None => TxStatus::Pending,
                Some(status) => match status.err {
                    Some(err) => TxStatus::Failed(err.to_string()),
                    None if status.satisfies_commitment(commitment) => TxStatus::Confirmed,
                    None => TxStatus::Pending,
                },
            };
            Ok(status)
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl ChainPort for SolanaClient {
    async fn recent_priority_fees(&self) -> PortResult<Vec<u64>> {
        Ok(self.get_recent_prioritization_fees().await?)
    }

    async fn send_transaction(&self, wire: &[u8]) -> PortResult<String> {
        let signature = self.send_wire_transaction(wire).await?;
        tracing::debug!(signature = %signature, "Transaction submitted");
        Ok(signature)
    }

    async fn signature_status(&self, signature: &str) -> PortResult<TxStatus> {
        Ok(self.get_signature_status(signature).await?)
    }
}
