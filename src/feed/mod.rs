//! Price feed module
//!
//! Provides the real-time reference price from the Coinbase ticker

mod coinbase;
mod types;

pub use coinbase::{CoinbaseConfig, CoinbaseFeed, COINBASE_WS_URL};
pub use types::PriceObservation;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for price feed implementations
///
/// Dropping the receiver ends the subscription.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Subscribe to price updates
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PriceObservation>>;
}
