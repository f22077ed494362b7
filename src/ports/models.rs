//! Common data structures and error types for all ports

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for port operations
pub type PortResult<T> = Result<T, PortError>;

/// Error hierarchy for port operations
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortError {
    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network/communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Protocol-specific error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The remote side refused the request
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Authentication/authorization error
    #[error("Authentication error: {0}")]
    Authentication(String),
}

impl PortError {
    /// Network or deadline failures the caller may retry later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Communication(_) | PortError::Timeout(_) | PortError::RateLimitExceeded
        )
    }
}

impl From<reqwest::Error> for PortError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PortError::Timeout(err.to_string())
        } else if err.is_decode() {
            PortError::Serialization(err.to_string())
        } else {
            PortError::Communication(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PortError {
    fn from(err: serde_json::Error) -> Self {
        PortError::Serialization(err.to_string())
    }
}

/// Commitment level for chain subscriptions and confirmations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}
