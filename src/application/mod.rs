//! Application Layer - Trade coordination and the event pipeline

pub mod trade_coordinator;
pub mod pipeline;

pub use trade_coordinator::{TradeCoordinator, TradeSettings, LAMPORTS_PER_SOL, WSOL_MINT};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineStats, StatsSnapshot};
