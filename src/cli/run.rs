//! Run command implementation

use crate::bot::{BotHandle, TradingBot};
use crate::config::{Config, Credentials, ExecutionMode};
use crate::execution::PaperGateway;
use crate::feed::CoinbaseFeed;
use crate::market::GammaClient;
use crate::orderbook::ClobBookClient;
use crate::position::PositionController;
use crate::selector::InstrumentSelector;
use crate::signal::SignalDetector;
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the notional per entry
    #[arg(long)]
    pub order_size: Option<Decimal>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if let Some(order_size) = self.order_size {
            config.trading.order_size = order_size;
        }
        config.validate()?;

        if config.execution.mode == ExecutionMode::Live {
            let credentials = Credentials::from_env()?;
            tracing::info!(funder = %credentials.funder, "Credentials loaded");
            anyhow::bail!(
                "Live order submission requires an EIP-712 order signer, which this build does not include; set execution.mode = \"paper\""
            );
        }

        let discovery = Arc::new(GammaClient::with_config(config.gamma_config())?);
        let books = ClobBookClient::with_config(config.clob_config())?;
        let gateway = Arc::new(PaperGateway::new(books, config.execution.fee_rate));

        let mut bot = TradingBot::new(
            config.bot_config(),
            SignalDetector::new(config.detector_config()),
            InstrumentSelector::new(config.selector_config()),
            discovery,
            PositionController::new(config.controller_config(), gateway),
        );
        let feed = CoinbaseFeed::with_config(config.feed_config());

        tokio::spawn(stop_on_signal(bot.handle()));
        if let Some(secs) = self.duration_secs {
            let handle = bot.handle();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                tracing::info!(secs, "Run duration elapsed");
                handle.stop();
            });
        }

        tracing::info!(
            mode = ?config.execution.mode,
            product = %config.feed.product_id,
            order_size = %config.trading.order_size,
            "Starting paper trading"
        );

        let summary = bot.run(&feed).await?;

        tracing::info!(
            signals = summary.signals,
            trades = summary.closed_trades.len(),
            realized_pnl = %summary.realized_pnl,
            final_state = %summary.final_state,
            "Session finished"
        );

        Ok(())
    }
}

/// Stop on the first SIGINT/SIGTERM, exit hard on the second
async fn stop_on_signal(handle: BotHandle) {
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping bot");
    handle.stop();

    shutdown_signal().await;
    tracing::warn!("Second shutdown signal, exiting without draining");
    std::process::exit(130);
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
