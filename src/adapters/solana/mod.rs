pub mod logs;
pub mod rpc;
pub mod wallet;

pub use logs::SolanaLogStream;
pub use rpc::{SolanaClient, SolanaClientError};
pub use wallet::{WalletError, WalletManager};

use solana_sdk::commitment_config::CommitmentConfig;

use crate::ports::Commitment;

pub(crate) fn commitment_config(commitment: Commitment) -> CommitmentConfig {
    match commitment {
        Commitment::Processed => CommitmentConfig::processed(),
        Commitment::Confirmed => CommitmentConfig::confirmed(),
        Commitment::Finalized => CommitmentConfig::finalized(),
    }
}
