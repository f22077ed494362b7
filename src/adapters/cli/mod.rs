//! CLI Adapter
//!
//! Command-line interface for Mention Sniper.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{log_level, CliApp, Command, ExportKeyCmd, QuoteCmd, RunCmd, StatusCmd};
