//! CLI Command Definitions
//!
//! Argument structures for every `mention-sniper` subcommand.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Mention Sniper - buys Solana tokens called out by credible accounts
#[derive(Parser, Debug)]
#[command(
    name = "mention-sniper",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Correlates social mentions with on-chain swap flow and trades via Jupiter",
    long_about = "Mention Sniper watches a keyword-filtered social stream for token \
                  addresses, scores each candidate with token, safety and author \
                  credibility analysis, and buys qualifying tokens through Jupiter."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the pipeline until Ctrl+C
    Run(RunCmd),

    /// Ask the router for a quote for the configured spend
    Quote(QuoteCmd),

    /// Convert a base58 secret key to the JSON keypair file format
    ExportKey(ExportKeyCmd),

    /// Show wallet address and SOL balance
    Status(StatusCmd),
}

impl Command {
    /// Configuration file the command reads, if any
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Run(cmd) => Some(&cmd.config),
            Command::Quote(cmd) => Some(&cmd.config),
            Command::Status(cmd) => Some(&cmd.config),
            Command::ExportKey(_) => None,
        }
    }
}

/// Start the pipeline
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/mainnet.toml")]
    pub config: PathBuf,
}

/// Get a diagnostic quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Output token mint address
    #[arg(value_name = "MINT")]
    pub mint: String,

    /// Spend in SOL (defaults to the configured spend)
    #[arg(short, long, value_name = "SOL")]
    pub amount: Option<f64>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/mainnet.toml")]
    pub config: PathBuf,
}

/// Export a base58 secret key
#[derive(Parser, Debug)]
pub struct ExportKeyCmd {
    /// Base58 secret key, as exported by browser wallets
    #[arg(value_name = "BASE58_SECRET")]
    pub secret: String,

    /// Write the keypair file here instead of printing it
    #[arg(short, long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,
}

/// Check wallet status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/mainnet.toml")]
    pub config: PathBuf,
}

/// Log level from flags, falling back to the configured level
pub fn log_level<'a>(verbose: bool, debug: bool, configured: Option<&'a str>) -> &'a str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured.unwrap_or("warn")
    }
}
