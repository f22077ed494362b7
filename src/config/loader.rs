//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.
//! Secrets may be supplied through the environment (see the `get_*` accessors).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::analysis::{AnalysisConfig, ID_PLACEHOLDER};
use crate::adapters::jupiter::{JupiterConfig, DEFAULT_API_BASE_URL as JUPITER_API_URL};
use crate::adapters::social::XStreamConfig;
use crate::application::{PipelineConfig, TradeSettings, LAMPORTS_PER_SOL, WSOL_MINT};
use crate::application::pipeline::DEFAULT_QUEUE_CAPACITY;
use crate::domain::{
    DecisionPolicy, GasPolicy, MentionFilterConfig, DEFAULT_COMPUTE_UNIT_LIMIT,
    DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_RISK_SCORE, DEFAULT_MIN_FOLLOWER_COUNT,
    DEFAULT_MIN_PRIORITY_FEE, DEFAULT_TREND_WINDOW,
};
use crate::ports::Commitment;
use crate::strategy::evaluators::{
    DEFAULT_MIN_CREDIBILITY, DEFAULT_MIN_LIQUIDITY, GATE_CREDIBILITY, GATE_LIQUIDITY, GATE_RUG_SAFE,
};
use crate::strategy::ScoringWeights;

const KNOWN_GATES: [&str; 3] = [GATE_LIQUIDITY, GATE_RUG_SAFE, GATE_CREDIBILITY];

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solana: SolanaSection,
    pub watch: WatchSection,
    pub social: SocialSection,
    pub scoring: ScoringSection,
    pub trade: TradeSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub alerts: AlertsSection,
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint (use private RPC for production)
    pub rpc_url: String,
    /// Websocket endpoint for log subscriptions
    pub ws_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    #[serde(default)]
    pub commitment: Commitment,
    /// Wallet keypair path (NEVER commit this file!)
    #[serde(default)]
    pub keypair_path: String,
}

impl SolanaSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// Get keypair path with environment variable override, `~` expanded
    pub fn get_keypair_path(&self) -> PathBuf {
        let raw = std::env::var("SOLANA_KEYPAIR_PATH").unwrap_or_else(|_| self.keypair_path.clone());
        PathBuf::from(shellexpand::tilde(&raw).into_owned())
    }
}

/// On-chain pool being watched
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// AMM program whose logs are subscribed
    pub program_id: String,
    pub pool_id: String,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// Trend report interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialSection {
    #[serde(default = "default_stream_url")]
    pub stream_url: String,
    #[serde(default)]
    pub bearer_token: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_min_follower_count")]
    pub min_follower_count: u64,
}

impl SocialSection {
    /// Checks X_BEARER_TOKEN env var first, falls back to config value
    pub fn get_bearer_token(&self) -> String {
        std::env::var("X_BEARER_TOKEN").unwrap_or_else(|_| self.bearer_token.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSection {
    /// Composite score at or above which a candidate is bought. Required.
    pub buy_threshold: f64,
    /// Flags that must all be true for a BUY
    #[serde(default)]
    pub mandatory_gates: Vec<String>,
    #[serde(default = "default_evaluator_timeout_ms")]
    pub evaluator_timeout_ms: u64,
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity: f64,
    #[serde(default = "default_max_risk_score")]
    pub max_risk_score: f64,
    #[serde(default = "default_min_credibility")]
    pub min_credibility: f64,
    #[serde(default)]
    pub weights: ScoringWeights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeSection {
    /// Per-token cooldown between evaluations. Required.
    pub cooldown_secs: u64,
    #[serde(default = "default_spend_amount_sol")]
    pub spend_amount_sol: Decimal,
    #[serde(default = "default_input_mint")]
    pub input_mint: String,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,
    /// Floor for the priority fee, micro-lamports per CU
    #[serde(default = "default_min_priority_fee")]
    pub min_priority_fee: u64,
    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

impl TradeSection {
    /// Spend in lamports, if representable
    pub fn spend_lamports(&self) -> Option<u64> {
        (self.spend_amount_sol * Decimal::from(LAMPORTS_PER_SOL)).trunc().to_u64()
    }
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterSection {
    #[serde(default = "default_jupiter_url")]
    pub api_url: String,
    /// Optional API key for higher rate limits (get from jup.ag)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_url: default_jupiter_url(),
            api_key: None,
        }
    }
}

impl JupiterSection {
    /// Get API key with environment variable fallback
    /// Checks JUPITER_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("JUPITER_API_KEY").ok()
    }
}

/// Analysis service endpoints. Each URL contains `{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSection {
    pub token_analysis_url: String,
    pub safety_url: String,
    pub credibility_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertsSection {
    /// Enable Discord webhook notifications
    #[serde(default)]
    pub discord_enabled: bool,
    /// Discord webhook URL
    #[serde(default)]
    pub discord_webhook_url: String,
    /// Enable Telegram notifications
    #[serde(default)]
    pub telegram_enabled: bool,
    /// Telegram bot token
    #[serde(default)]
    pub telegram_bot_token: String,
    /// Telegram chat ID
    #[serde(default)]
    pub telegram_chat_id: String,
}

impl AlertsSection {
    /// Checks TELEGRAM_BOT_TOKEN env var first, falls back to config value
    pub fn get_telegram_bot_token(&self) -> String {
        std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| self.telegram_bot_token.clone())
    }
}

fn default_history_capacity() -> usize { DEFAULT_HISTORY_CAPACITY }
fn default_trend_window() -> usize { DEFAULT_TREND_WINDOW }
fn default_poll_interval_ms() -> u64 { 10_000 }
fn default_stream_url() -> String { crate::adapters::social::DEFAULT_API_BASE_URL.to_string() }
fn default_min_follower_count() -> u64 { DEFAULT_MIN_FOLLOWER_COUNT }
fn default_evaluator_timeout_ms() -> u64 { 5_000 }
fn default_min_liquidity() -> f64 { DEFAULT_MIN_LIQUIDITY }
fn default_max_risk_score() -> f64 { DEFAULT_MAX_RISK_SCORE }
fn default_min_credibility() -> f64 { DEFAULT_MIN_CREDIBILITY }
fn default_spend_amount_sol() -> Decimal { dec!(0.1) }
fn default_input_mint() -> String { WSOL_MINT.to_string() }
fn default_slippage_bps() -> u16 { 100 }
fn default_min_priority_fee() -> u64 { DEFAULT_MIN_PRIORITY_FEE }
fn default_compute_unit_limit() -> u32 { DEFAULT_COMPUTE_UNIT_LIMIT }
fn default_request_timeout_ms() -> u64 { 10_000 }
fn default_confirm_timeout_secs() -> u64 { 60 }
fn default_jupiter_url() -> String { JUPITER_API_URL.to_string() }
fn default_log_level() -> String { "info".to_string() }

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}

fn check_pubkey(field: &str, value: &str) -> Result<(), ConfigError> {
    Pubkey::from_str(value)
        .map(|_| ())
        .map_err(|e| invalid(format!("{} '{}' is not a valid address: {}", field, value, e)))
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Solana
        if self.solana.rpc_url.is_empty() {
            return Err(invalid("rpc_url cannot be empty"));
        }
        if self.solana.ws_url.is_empty() {
            return Err(invalid("ws_url cannot be empty"));
        }

        // Watch
        check_pubkey("program_id", &self.watch.program_id)?;
        check_pubkey("pool_id", &self.watch.pool_id)?;
        if self.watch.history_capacity == 0 {
            return Err(invalid("history_capacity must be > 0"));
        }
        if self.watch.trend_window == 0 {
            return Err(invalid("trend_window must be > 0"));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms must be > 0"));
        }

        // Social
        if self.social.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(invalid("social.keywords must contain at least one keyword"));
        }

        // Scoring
        if !self.scoring.buy_threshold.is_finite() {
            return Err(invalid("buy_threshold must be a finite number"));
        }
        if let Some(gate) = self
            .scoring
            .mandatory_gates
            .iter()
            .find(|g| !KNOWN_GATES.contains(&g.as_str()))
        {
            return Err(invalid(format!(
                "unknown mandatory gate '{}', expected one of {:?}",
                gate, KNOWN_GATES
            )));
        }
        if self.scoring.evaluator_timeout_ms == 0 {
            return Err(invalid("evaluator_timeout_ms must be > 0"));
        }
        if !(0.0..=100.0).contains(&self.scoring.max_risk_score) {
            return Err(invalid(format!(
                "max_risk_score must be 0-100, got {}",
                self.scoring.max_risk_score
            )));
        }

        let w = &self.scoring.weights;
        let p = &w.rug_penalties;
        for (name, value) in [
            ("min_liquidity", self.scoring.min_liquidity),
            ("min_credibility", self.scoring.min_credibility),
            ("weights.liquidity_full_at", w.liquidity_full_at),
            ("weights.liquidity_points", w.liquidity_points),
            ("weights.liquidity_per_unit", w.liquidity_per_unit),
            ("weights.smart_money_per_wallet", w.smart_money_per_wallet),
            ("weights.smart_money_cap", w.smart_money_cap),
            ("weights.holders_points", w.holders_points),
            ("weights.holders_per_point", w.holders_per_point),
            ("weights.safety_weight", w.safety_weight),
            ("weights.credibility_weight", w.credibility_weight),
            ("weights.rug_penalties.safe", p.safe),
            ("weights.rug_penalties.low", p.low),
            ("weights.rug_penalties.medium", p.medium),
            ("weights.rug_penalties.high", p.high),
            ("weights.rug_penalties.critical", p.critical),
        ] {
            if !value.is_finite() {
                return Err(invalid(format!("scoring.{} must be a finite number, got {}", name, value)));
            }
        }

        // Trade
        if self.trade.cooldown_secs == 0 {
            return Err(invalid("cooldown_secs must be > 0"));
        }
        match self.trade.spend_lamports() {
            Some(lamports) if lamports > 0 => {}
            _ => {
                return Err(invalid(format!(
                    "spend_amount_sol must be positive, got {}",
                    self.trade.spend_amount_sol
                )))
            }
        }
        check_pubkey("input_mint", &self.trade.input_mint)?;
        if self.trade.slippage_bps == 0 || self.trade.slippage_bps > 10_000 {
            return Err(invalid(format!(
                "slippage_bps must be 1-10000, got {}",
                self.trade.slippage_bps
            )));
        }
        if self.trade.compute_unit_limit == 0 {
            return Err(invalid("compute_unit_limit must be > 0"));
        }
        if self.trade.request_timeout_ms == 0 || self.trade.confirm_timeout_secs == 0 {
            return Err(invalid("trade timeouts must be > 0"));
        }

        // Jupiter
        if self.jupiter.api_url.is_empty() {
            return Err(invalid("api_url cannot be empty"));
        }

        // Analysis
        for (name, url) in [
            ("token_analysis_url", &self.analysis.token_analysis_url),
            ("safety_url", &self.analysis.safety_url),
            ("credibility_url", &self.analysis.credibility_url),
        ] {
            if !url.contains(ID_PLACEHOLDER) {
                return Err(invalid(format!("{} must contain {}", name, ID_PLACEHOLDER)));
            }
        }

        // Alerts
        if self.alerts.discord_enabled && self.alerts.discord_webhook_url.is_empty() {
            return Err(invalid("discord_enabled requires discord_webhook_url"));
        }
        if self.alerts.telegram_enabled && self.alerts.telegram_chat_id.is_empty() {
            return Err(invalid("telegram_enabled requires telegram_chat_id"));
        }

        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.trade.cooldown_secs)
    }

    pub fn evaluator_timeout(&self) -> Duration {
        Duration::from_millis(self.scoring.evaluator_timeout_ms)
    }
}

impl From<&Config> for MentionFilterConfig {
    fn from(config: &Config) -> Self {
        MentionFilterConfig {
            keywords: config.social.keywords.clone(),
            min_follower_count: config.social.min_follower_count,
        }
    }
}

impl From<&Config> for DecisionPolicy {
    fn from(config: &Config) -> Self {
        DecisionPolicy::new(config.scoring.buy_threshold, config.scoring.mandatory_gates.clone())
    }
}

impl From<&Config> for GasPolicy {
    fn from(config: &Config) -> Self {
        GasPolicy {
            compute_unit_limit: config.trade.compute_unit_limit,
            min_priority_fee: config.trade.min_priority_fee,
        }
    }
}

impl From<&Config> for TradeSettings {
    fn from(config: &Config) -> Self {
        TradeSettings {
            input_mint: config.trade.input_mint.clone(),
            spend_amount: config.trade.spend_lamports().unwrap_or(0),
            slippage_bps: config.trade.slippage_bps,
            request_timeout: Duration::from_millis(config.trade.request_timeout_ms),
            confirm_timeout: Duration::from_secs(config.trade.confirm_timeout_secs),
            ..TradeSettings::default()
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        PipelineConfig {
            program_id: config.watch.program_id.clone(),
            pool_id: config.watch.pool_id.clone(),
            commitment: config.solana.commitment,
            keyword_rules: config.social.keywords.clone(),
            report_interval: Duration::from_millis(config.watch.poll_interval_ms),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl From<&Config> for JupiterConfig {
    fn from(config: &Config) -> Self {
        JupiterConfig {
            api_base_url: config.jupiter.api_url.clone(),
            api_key: config.jupiter.get_api_key(),
            timeout: Duration::from_millis(config.trade.request_timeout_ms),
            ..JupiterConfig::default()
        }
    }
}

impl From<&Config> for AnalysisConfig {
    fn from(config: &Config) -> Self {
        AnalysisConfig {
            token_analysis_url: config.analysis.token_analysis_url.clone(),
            safety_url: config.analysis.safety_url.clone(),
            credibility_url: config.analysis.credibility_url.clone(),
            api_key: config.analysis.api_key.clone(),
            timeout: Duration::from_millis(config.analysis.timeout_ms),
        }
    }
}

impl From<&Config> for XStreamConfig {
    fn from(config: &Config) -> Self {
        XStreamConfig {
            api_base_url: config.social.stream_url.clone(),
            ..XStreamConfig::new(config.social.get_bearer_token())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[solana]
rpc_url = "https://api.mainnet-beta.solana.com"
ws_url = "wss://api.mainnet-beta.solana.com"
commitment = "confirmed"
keypair_path = "~/.config/solana/id.json"

[watch]
program_id = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"
pool_id = "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2"

[social]
keywords = ["memecoin", "pump"]

[scoring]
buy_threshold = 60.0
mandatory_gates = ["liquidity_above_floor", "rug_safe"]

[trade]
cooldown_secs = 300
spend_amount_sol = 0.25

[analysis]
token_analysis_url = "https://analysis.example/tokens/{id}"
safety_url = "https://analysis.example/safety/{id}"
credibility_url = "https://analysis.example/authors/{id}"
"#
        .to_string()
    }

    fn load_str(content: &str) -> Result<Config, ConfigError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_shipped_mainnet_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/mainnet.toml");
        let config = load_config(&path).unwrap();

        assert_eq!(config.scoring.buy_threshold, 70.0);
        assert_eq!(config.scoring.mandatory_gates.len(), 2);
        assert_eq!(config.cooldown(), Duration::from_secs(300));
    }

    #[test]
    fn test_load_valid_config() {
        let config = load_str(&create_valid_config()).unwrap();

        assert_eq!(config.scoring.buy_threshold, 60.0);
        assert_eq!(config.trade.cooldown_secs, 300);
        assert_eq!(config.watch.history_capacity, 100);
        assert_eq!(config.watch.trend_window, 5);
        assert_eq!(config.watch.poll_interval_ms, 10_000);
        assert_eq!(config.social.min_follower_count, 100);
        assert_eq!(config.trade.input_mint, WSOL_MINT);
        assert_eq!(config.trade.spend_lamports(), Some(250_000_000));
        assert_eq!(config.jupiter.api_url, JUPITER_API_URL);
        assert_eq!(config.logging.level, "info");
        assert!(!config.alerts.telegram_enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_missing_buy_threshold_is_parse_error() {
        let content = create_valid_config().replace("buy_threshold = 60.0\n", "");
        assert!(matches!(load_str(&content).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_cooldown_is_parse_error() {
        let content = create_valid_config().replace("cooldown_secs = 300\n", "");
        assert!(matches!(load_str(&content).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_gate_rejected() {
        let content = create_valid_config().replace("\"rug_safe\"", "\"rug_saef\"");
        let err = load_str(&content).unwrap_err();
        assert!(err.to_string().contains("rug_saef"));
    }

    #[test]
    fn test_invalid_pool_rejected() {
        let content = create_valid_config().replace(
            "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2",
            "not-a-pool",
        );
        assert!(matches!(load_str(&content).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let content = create_valid_config().replace("safety/{id}", "safety");
        let err = load_str(&content).unwrap_err();
        assert!(err.to_string().contains("safety_url"));
    }

    #[test]
    fn test_zero_spend_rejected() {
        let content = create_valid_config().replace("spend_amount_sol = 0.25", "spend_amount_sol = 0");
        assert!(matches!(load_str(&content).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let content = create_valid_config().replace(r#"["memecoin", "pump"]"#, "[]");
        assert!(matches!(load_str(&content).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_non_finite_scoring_values_rejected() {
        for (section, line) in [
            ("[scoring.weights]", "credibility_weight = nan"),
            ("[scoring.weights]", "liquidity_points = inf"),
            ("[scoring.weights.rug_penalties]", "critical = -inf"),
        ] {
            let content = format!("{}\n{}\n{}\n", create_valid_config(), section, line);
            match load_str(&content) {
                Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("finite"), "{}", msg),
                other => panic!("{} accepted: {:?}", line, other.map(|_| ())),
            }
        }

        let content = create_valid_config().replace(
            "buy_threshold = 60.0",
            "buy_threshold = 60.0\nmin_credibility = nan",
        );
        assert!(matches!(load_str(&content).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_enabled_alert_requires_target() {
        let content = format!("{}\n[alerts]\ndiscord_enabled = true\n", create_valid_config());
        assert!(matches!(load_str(&content).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_conversions() {
        let config = load_str(&create_valid_config()).unwrap();

        let settings = TradeSettings::from(&config);
        assert_eq!(settings.spend_amount, 250_000_000);
        assert_eq!(settings.slippage_bps, 100);

        let gas = GasPolicy::from(&config);
        assert_eq!(gas.compute_unit_limit, DEFAULT_COMPUTE_UNIT_LIMIT);

        let pipeline = PipelineConfig::from(&config);
        assert_eq!(pipeline.keyword_rules, vec!["memecoin", "pump"]);
        assert_eq!(pipeline.report_interval, Duration::from_secs(10));

        assert_eq!(config.cooldown(), Duration::from_secs(300));
        assert_eq!(config.evaluator_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_keypair_path_tilde_expanded() {
        let section = SolanaSection {
            rpc_url: "http://x".to_string(),
            ws_url: "ws://x".to_string(),
            commitment: Commitment::Confirmed,
            keypair_path: "~/id.json".to_string(),
        };
        if std::env::var("SOLANA_KEYPAIR_PATH").is_err() {
            assert!(!section.get_keypair_path().to_string_lossy().starts_with('~'));
        }
    }
}
