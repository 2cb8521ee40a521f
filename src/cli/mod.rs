//! CLI interface for swing-bot
//!
//! Provides subcommands for:
//! - `run`: Start the trading loop
//! - `config`: Show the effective configuration
//! - `market`: Resolve today's threshold market

mod market;
mod run;

pub use market::MarketArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "swing-bot")]
#[command(about = "Momentum swing trading bot for Polymarket daily BTC price-threshold markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the trading loop
    Run(RunArgs),
    /// Show the effective configuration
    Config,
    /// Resolve today's threshold market and selection
    Market(MarketArgs),
}
