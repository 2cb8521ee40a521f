//! Market command implementation

use crate::config::Config;
use crate::execution::PaperGateway;
use crate::market::{market_key, GammaClient, InstrumentDiscovery};
use crate::orderbook::ClobBookClient;
use crate::selector::InstrumentSelector;
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct MarketArgs {
    /// Reference price used to select a threshold
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Market key override, e.g. bitcoin-price-on-october-18
    #[arg(long)]
    pub key: Option<String>,
}

impl MarketArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let key = self
            .key
            .clone()
            .unwrap_or_else(|| market_key(&config.market.slug_prefix, Utc::now()));

        let client = GammaClient::with_config(config.gamma_config())?;
        let instruments = client.fetch_instruments(&key).await?;

        println!("Market: {}", key);
        for (threshold, pair) in &instruments {
            println!("  {:>10}  yes={}  no={}", threshold, pair.yes, pair.no);
        }

        let Some(price) = self.price else {
            return Ok(());
        };

        let books = PaperGateway::new(ClobBookClient::with_config(config.clob_config())?, Decimal::ZERO);
        let selector = InstrumentSelector::new(config.selector_config());
        let selection = selector.resolve(&instruments, price, None, &books).await?;

        println!();
        println!("Reference price: {}", price);
        println!("Selected threshold: {} ({})", selection.threshold, selection.instrument());

        Ok(())
    }
}
