//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Chain log subscriptions and swap log decoding
//! - The social post stream
//! - Swap routing, signing and chain submission
//! - Token, safety and credibility analysis services
//! - Notification sinks

pub mod models;
pub mod chain_logs;
pub mod social;
pub mod execution;
pub mod chain;
pub mod analysis;
pub mod notifier;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main traits and types
pub use models::{Commitment, PortError, PortResult};
pub use chain_logs::{LogNotification, LogSubscription, LogSubscriptionPort, NullSwapDecoder, SubscriptionId, SwapLogDecoder};
pub use social::SocialStreamPort;
pub use execution::{ExecutionError, QuoteParams, RouteQuote, RouterPort, SignedTransaction, TransactionSigner};
pub use chain::{ChainPort, TxStatus};
pub use analysis::{CredibilityPort, CredibilityReport, SafetyCheckPort, SafetyReport, TokenAnalysis, TokenAnalysisPort};
pub use notifier::{notify, NotificationPort};
