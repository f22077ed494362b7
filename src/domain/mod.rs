//! Domain Layer - Core correlation and decision logic
//!
//! Pure types and logic with no I/O. All external interactions happen
//! through the ports layer.
//!
//! - `swap_tracker`: rolling swap history and volume trend for the watched pool
//! - `mention_filter`: keyword, follower and token-address extraction for posts
//! - `cooldown`: per-token TTL gate for at-most-once evaluation
//! - `evaluation`: evaluator results and aggregated scores
//! - `decision`: pure BUY/SKIP policy
//! - `gas`: compute budget settings and the sticky success value
//! - `trade`: trade stages, failures and outcomes

pub mod swap_tracker;
pub mod mention_filter;
pub mod candidate;
pub mod cooldown;
pub mod rug_detector;
pub mod evaluation;
pub mod decision;
pub mod gas;
pub mod trade;

pub use swap_tracker::{DEFAULT_HISTORY_CAPACITY, DEFAULT_TREND_WINDOW, SwapEvent, SwapEventTracker, MarketHistory, TrackerSnapshot, VolumeTrend};
pub use mention_filter::{DEFAULT_MIN_FOLLOWER_COUNT, Mention, MentionFilter, MentionFilterConfig, MentionFilterError, RejectReason, SocialPost};
pub use candidate::Candidate;
pub use cooldown::CooldownGate;
pub use rug_detector::{DEFAULT_MAX_RISK_SCORE, RugPullRisk, RugDetectorError};
pub use evaluation::{AggregatedScore, EvaluationResult, MetricValue, Metrics, ScoreOutcome};
pub use decision::{Decision, DecisionPolicy, SkipReason};
pub use gas::{DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_MIN_PRIORITY_FEE, GasPolicy, GasSettings, StickyGas};
pub use trade::{TradeFailure, TradeOutcome, TradeStage};
