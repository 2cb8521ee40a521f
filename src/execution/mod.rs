//! Execution gateway module
//!
//! Quoting, order book probing and market order placement

mod paper;
#[cfg(test)]
pub(crate) mod scripted;
mod types;

pub use paper::PaperGateway;
pub use types::{ExecutionError, ExecutionErrorKind, Fill, OrderFill, OrderId, Side};

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Venue operations the position controller depends on
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Best ask (price to buy at), `None` when unavailable
    async fn quote_ask(&self, instrument: &str) -> Option<Decimal>;
    /// Best bid (price to sell at), `None` when unavailable
    async fn quote_bid(&self, instrument: &str) -> Option<Decimal>;
    /// Check if the venue has an order book for the instrument
    async fn orderbook_exists(&self, instrument: &str) -> bool;
    /// Place a fill-and-kill market order
    ///
    /// Buy amounts are notional, sell amounts are shares.
    async fn place_market_order(
        &self,
        side: Side,
        instrument: &str,
        amount: Decimal,
    ) -> Result<OrderFill, ExecutionError>;
}
