//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: route quotes and unsigned swap transactions
//! - Solana: RPC client, wallet signing and program log subscriptions
//! - Social: X filtered stream client
//! - Analysis: token, safety and credibility HTTP services
//! - Notify: Telegram, Discord and log sinks
//! - CLI: Command-line interface definitions

pub mod jupiter;
pub mod solana;
pub mod social;
pub mod analysis;
pub mod notify;
pub mod cli;

#[cfg(test)]
pub(crate) mod test_http;

pub use jupiter::JupiterClient;
pub use solana::{SolanaClient, SolanaLogStream, WalletManager};
pub use social::XStreamClient;
pub use analysis::AnalysisClient;
pub use notify::{DiscordNotifier, LogNotifier, MultiNotifier, TelegramNotifier};
pub use cli::CliApp;
