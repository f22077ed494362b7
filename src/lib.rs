//! Mention Sniper Library
//!
//! Correlates social mentions of Solana tokens with on-chain swap flow,
//! scores candidates through independent evaluators and buys qualifying
//! tokens via the Jupiter aggregator.
//!
//! # Modules
//!
//! - `domain`: Core logic (SwapEventTracker, MentionFilter, CooldownGate, DecisionPolicy, gas)
//! - `ports`: Trait abstractions (chain logs, social stream, router, signer, chain, analysis, notifier)
//! - `strategy`: Evaluators, scoring and the SignalAggregator
//! - `adapters`: External implementations (Jupiter, Solana, X stream, analysis HTTP, notifiers, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: TradeCoordinator and the event pipeline

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
