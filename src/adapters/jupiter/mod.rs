//! Jupiter Adapter
//!
//! Implementation of the RouterPort for the Jupiter DEX aggregator.

mod client;
mod quote;
mod swap;

pub use client::{JupiterClient, JupiterConfig, DEFAULT_API_BASE_URL};
pub use quote::{QuoteRequest, QuoteResponse, RoutePlanStep, SwapInfo};
pub use swap::{SwapRequest, SwapResponse};
