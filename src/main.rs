//! Mention Sniper
//!
//! Correlates social mentions with on-chain swap flow and buys qualifying
//! Solana tokens via the Jupiter aggregator.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use mention_sniper::adapters::analysis::{AnalysisClient, AnalysisConfig};
use mention_sniper::adapters::cli::{log_level, CliApp, Command, ExportKeyCmd, QuoteCmd};
use mention_sniper::adapters::jupiter::{JupiterClient, JupiterConfig};
use mention_sniper::adapters::notify::{DiscordNotifier, LogNotifier, MultiNotifier, TelegramNotifier};
use mention_sniper::adapters::social::{XStreamClient, XStreamConfig};
use mention_sniper::adapters::solana::{SolanaClient, SolanaLogStream, WalletManager};
use mention_sniper::application::{Pipeline, PipelineConfig, TradeCoordinator, TradeSettings, LAMPORTS_PER_SOL};
use mention_sniper::config::{load_config, Config};
use mention_sniper::config::loader::AlertsSection;
use mention_sniper::domain::{
    CooldownGate, DecisionPolicy, GasPolicy, MentionFilter, MentionFilterConfig, SwapEventTracker,
};
use mention_sniper::ports::{NullSwapDecoder, QuoteParams, RouterPort};
use mention_sniper::strategy::{
    CredibilityEvaluator, SafetyEvaluator, SignalAggregator, TokenAnalysisEvaluator, WeightedScoring,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    let config = match app.command.config_path() {
        Some(path) => Some(
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        ),
        None => None,
    };

    let level = log_level(
        app.verbose,
        app.debug,
        config.as_ref().map(|c| c.logging.level.as_str()),
    );
    init_logging(level)?;

    match (app.command, config) {
        (Command::ExportKey(cmd), _) => export_key_command(cmd),
        (Command::Run(_), Some(config)) => run_command(config).await,
        (Command::Quote(cmd), Some(config)) => quote_command(cmd, config).await,
        (Command::Status(_), Some(config)) => status_command(config).await,
        _ => bail!("Command requires a configuration file"),
    }
}

fn init_logging(level: &str) -> Result<()> {
    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

async fn run_command(config: Config) -> Result<()> {
    tracing::info!("Starting Mention Sniper...");

    let keypair_path = config.solana.get_keypair_path();
    let wallet = Arc::new(load_wallet_with_context(&keypair_path)?);
    tracing::info!(wallet = %wallet.public_key(), "Wallet loaded");

    let solana = Arc::new(
        SolanaClient::new(config.solana.get_rpc_url(), config.solana.commitment)
            .with_fee_accounts(&[config.watch.pool_id.clone()])
            .context("Invalid pool id for fee sampling")?,
    );
    let jupiter = Arc::new(
        JupiterClient::with_config(JupiterConfig::from(&config))
            .context("Failed to create Jupiter client")?,
    );
    let analysis = Arc::new(
        AnalysisClient::new(AnalysisConfig::from(&config))
            .context("Failed to create analysis client")?,
    );
    let notifier = Arc::new(build_notifier(&config.alerts)?);

    let cooldown = Arc::new(CooldownGate::new(config.cooldown()));
    let scoring = Arc::new(WeightedScoring::new(config.scoring.weights.clone()));
    let aggregator = SignalAggregator::new(scoring, config.evaluator_timeout(), cooldown)
        .with_evaluator(Arc::new(TokenAnalysisEvaluator::new(
            analysis.clone(),
            config.scoring.min_liquidity,
        )))
        .with_evaluator(Arc::new(SafetyEvaluator::new(
            analysis.clone(),
            config.scoring.max_risk_score,
        )))
        .with_evaluator(Arc::new(CredibilityEvaluator::new(
            analysis,
            config.scoring.min_credibility,
        )));
    tracing::info!(evaluators = ?aggregator.evaluator_names(), "Signal aggregator ready");

    let coordinator = Arc::new(TradeCoordinator::new(
        jupiter,
        wallet,
        solana,
        notifier,
        GasPolicy::from(&config),
        TradeSettings::from(&config),
    ));

    let tracker = Arc::new(SwapEventTracker::with_config(
        config.watch.pool_id.clone(),
        config.watch.history_capacity,
        config.watch.trend_window,
    ));
    tracing::warn!("No swap log decoder configured; volume tracking is disabled");

    let filter = MentionFilter::new(MentionFilterConfig::from(&config))
        .context("Invalid mention filter configuration")?;
    let social = XStreamClient::new(XStreamConfig::from(&config))
        .context("Failed to create social stream client")?;

    let pipeline = Pipeline::new(
        PipelineConfig::from(&config),
        Arc::new(SolanaLogStream::new(config.solana.ws_url.clone())),
        Arc::new(NullSwapDecoder),
        Arc::new(social),
        filter,
        aggregator,
        DecisionPolicy::from(&config),
        coordinator,
        tracker,
    );

    // Setup Ctrl+C handler
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        signal.cancel();
    });

    let stats = pipeline.run(shutdown).await.context("Pipeline failed to start")?;
    tracing::info!(
        candidates = stats.candidates,
        buys = stats.buys,
        skips = stats.skips,
        confirmed = stats.trades_confirmed,
        failed = stats.trades_failed,
        discarded = stats.buys_discarded,
        "Mention Sniper stopped"
    );
    Ok(())
}

fn build_notifier(alerts: &AlertsSection) -> Result<MultiNotifier> {
    let mut notifier = MultiNotifier::new().with_sink(Arc::new(LogNotifier));

    if alerts.telegram_enabled {
        let telegram = TelegramNotifier::new(alerts.get_telegram_bot_token(), alerts.telegram_chat_id.clone())
            .context("Failed to create Telegram notifier")?;
        notifier = notifier.with_sink(Arc::new(telegram));
    }
    if alerts.discord_enabled {
        let discord = DiscordNotifier::new(alerts.discord_webhook_url.clone())
            .context("Failed to create Discord notifier")?;
        notifier = notifier.with_sink(Arc::new(discord));
    }

    Ok(notifier)
}

async fn status_command(config: Config) -> Result<()> {
    let solana = SolanaClient::new(config.solana.get_rpc_url(), config.solana.commitment);
    let wallet = load_wallet_with_context(&config.solana.get_keypair_path())?;

    let balance = solana
        .get_balance(&wallet.public_key())
        .await
        .context("Failed to get balance")?;

    let sol = Decimal::from(balance) / Decimal::from(LAMPORTS_PER_SOL);
    println!("Wallet: {}", wallet.public_key());
    println!("Balance: {} lamports ({:.4} SOL)", balance, sol);

    Ok(())
}

async fn quote_command(cmd: QuoteCmd, config: Config) -> Result<()> {
    let jupiter = JupiterClient::with_config(JupiterConfig::from(&config))?;
    let settings = TradeSettings::from(&config);

    let amount = match cmd.amount {
        Some(sol) => Decimal::from_f64(sol)
            .map(|d| d * Decimal::from(LAMPORTS_PER_SOL))
            .and_then(|d| d.trunc().to_u64())
            .filter(|lamports| *lamports > 0)
            .with_context(|| format!("Invalid amount: {}", sol))?,
        None => settings.spend_amount,
    };

    let params = QuoteParams {
        input_mint: settings.input_mint.clone(),
        output_mint: cmd.mint.clone(),
        amount,
        slippage_bps: settings.slippage_bps,
    };

    let quote = jupiter.quote(&params).await.context("Failed to get quote")?;

    println!(
        "Quote: {} SOL -> {} base units of {}",
        Decimal::from(quote.in_amount) / Decimal::from(LAMPORTS_PER_SOL),
        quote.out_amount,
        cmd.mint
    );
    println!("Price impact: {}%", quote.price_impact_pct);

    Ok(())
}

fn export_key_command(cmd: ExportKeyCmd) -> Result<()> {
    let wallet = WalletManager::from_base58(&cmd.secret).context("Failed to decode secret key")?;
    eprintln!("Public key: {}", wallet.public_key());

    match cmd.outfile {
        Some(path) => {
            wallet
                .save_to_file(&path)
                .with_context(|| format!("Failed to write keypair to {}", path.display()))?;
            eprintln!("Keypair written to {}", path.display());
        }
        None => println!("{}", wallet.to_json()?),
    }
    Ok(())
}

/// Load wallet with helpful error messages
fn load_wallet_with_context(keypair_path: &Path) -> Result<WalletManager> {
    if !keypair_path.exists() {
        bail!(
            "Wallet file not found: {}\n\n\
             To create a new wallet, run:\n  \
             solana-keygen new --outfile {}\n\n\
             Or import a base58 secret with:\n  \
             mention-sniper export-key <SECRET> --outfile {}",
            keypair_path.display(),
            keypair_path.display(),
            keypair_path.display()
        );
    }

    WalletManager::from_file(keypair_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load wallet from '{}': {}\n\n\
             The file exists but may be corrupted or in the wrong format.\n\
             Expected format: JSON array of bytes (e.g., [1,2,3,...])",
            keypair_path.display(),
            e
        )
    })
}
