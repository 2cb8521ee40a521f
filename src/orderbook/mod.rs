//! Order book module
//!
//! Order book snapshots from the Polymarket CLOB

mod book;
mod client;

pub use book::OrderBook;
pub use client::{ClobBookClient, ClobConfig, CLOB_API_URL};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price level in the order book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price at this level
    pub price: Decimal,
    /// Total size available
    pub size: Decimal,
}

/// Source of order book snapshots
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Fetch the current book, `None` when the venue has no book for the token
    async fn fetch_book(&self, token_id: &str) -> anyhow::Result<Option<OrderBook>>;
}
