//! Paper trading gateway
//!
//! Quotes come from a live book source; fills are simulated against the top
//! of book, so orders larger than the best level fill partially.

use super::{ExecutionError, ExecutionErrorKind, ExecutionGateway, Fill, OrderFill, Side};
use crate::orderbook::{BookSource, OrderBook};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Share precision accepted by the venue for taker amounts
const SHARE_DECIMALS: u32 = 4;

/// Paper trading gateway with simulated fills
pub struct PaperGateway<S> {
    source: S,
    fee_rate: Decimal,
    fills: Arc<RwLock<Vec<Fill>>>,
    holdings: Arc<RwLock<HashMap<String, Decimal>>>,
}

impl<S: BookSource> PaperGateway<S> {
    /// Create a new paper gateway over a book source
    pub fn new(source: S, fee_rate: Decimal) -> Self {
        Self {
            source,
            fee_rate,
            fills: Arc::new(RwLock::new(vec![])),
            holdings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// All simulated fills so far
    pub async fn fills(&self) -> Vec<Fill> {
        self.fills.read().await.clone()
    }

    /// Shares currently held for a token
    pub async fn holding(&self, token_id: &str) -> Decimal {
        self.holdings
            .read()
            .await
            .get(token_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    async fn book(&self, instrument: &str) -> Result<OrderBook, ExecutionError> {
        match self.source.fetch_book(instrument).await {
            Ok(Some(book)) => Ok(book),
            Ok(None) => Err(ExecutionError::new(
                ExecutionErrorKind::NoOrderbook,
                format!("orderbook does not exist for token {}", instrument),
            )),
            Err(e) => Err(ExecutionError::transport(e)),
        }
    }

    async fn record(&self, fill: Fill) {
        let delta = match fill.side {
            Side::Buy => fill.size,
            Side::Sell => -fill.size,
        };

        let mut holdings = self.holdings.write().await;
        let held = holdings.entry(fill.token_id.clone()).or_insert(Decimal::ZERO);
        *held = (*held + delta).max(Decimal::ZERO);
        drop(holdings);

        self.fills.write().await.push(fill);
    }
}

#[async_trait]
impl<S: BookSource> ExecutionGateway for PaperGateway<S> {
    async fn quote_ask(&self, instrument: &str) -> Option<Decimal> {
        match self.book(instrument).await {
            Ok(book) => book.best_ask(),
            Err(e) => {
                tracing::warn!(instrument, error = %e, "Ask quote unavailable");
                None
            }
        }
    }

    async fn quote_bid(&self, instrument: &str) -> Option<Decimal> {
        match self.book(instrument).await {
            Ok(book) => book.best_bid(),
            Err(e) => {
                tracing::warn!(instrument, error = %e, "Bid quote unavailable");
                None
            }
        }
    }

    async fn orderbook_exists(&self, instrument: &str) -> bool {
        matches!(self.source.fetch_book(instrument).await, Ok(Some(_)))
    }

    async fn place_market_order(
        &self,
        side: Side,
        instrument: &str,
        amount: Decimal,
    ) -> Result<OrderFill, ExecutionError> {
        if amount <= Decimal::ZERO {
            return Err(ExecutionError::new(
                ExecutionErrorKind::Rejected,
                format!("invalid amount {}", amount),
            ));
        }

        let book = self.book(instrument).await?;

        let (price, filled) = match side {
            Side::Buy => {
                let ask = book.best_ask().filter(|p| !p.is_zero()).ok_or_else(|| {
                    ExecutionError::new(ExecutionErrorKind::NoLiquidity, "no asks to match")
                })?;
                let wanted = (amount / ask)
                    .round_dp_with_strategy(SHARE_DECIMALS, RoundingStrategy::ToZero);
                let available = book.best_ask_size().unwrap_or(Decimal::ZERO);
                (ask, wanted.min(available))
            }
            Side::Sell => {
                let held = self.holding(instrument).await;
                if amount > held {
                    return Err(ExecutionError::from_venue_message(format!(
                        "not enough balance: selling {} but holding {}",
                        amount, held
                    )));
                }
                let bid = book.best_bid().ok_or_else(|| {
                    ExecutionError::new(ExecutionErrorKind::NoLiquidity, "no bids to match")
                })?;
                let available = book.best_bid_size().unwrap_or(Decimal::ZERO);
                (bid, amount.min(available))
            }
        };

        if filled <= Decimal::ZERO {
            return Err(ExecutionError::new(
                ExecutionErrorKind::NoLiquidity,
                "no orders found to match with FAK order",
            ));
        }

        let order_id = Uuid::new_v4().to_string();
        let fees = filled * price * self.fee_rate;

        self.record(Fill {
            order_id: order_id.clone(),
            token_id: instrument.to_string(),
            side,
            price,
            size: filled,
            timestamp: Utc::now(),
            fees,
        })
        .await;

        tracing::info!(%order_id, %side, instrument, %price, %filled, "Paper order filled");

        Ok(OrderFill {
            order_id,
            side,
            instrument: instrument.to_string(),
            requested_amount: amount,
            filled_amount: filled,
            avg_price: price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::PriceLevel;
    use rust_decimal_macros::dec;

    /// Fixed books keyed by token
    struct StaticBooks(HashMap<String, OrderBook>);

    #[async_trait]
    impl BookSource for StaticBooks {
        async fn fetch_book(&self, token_id: &str) -> anyhow::Result<Option<OrderBook>> {
            Ok(self.0.get(token_id).cloned())
        }
    }

    fn gateway(bid: (Decimal, Decimal), ask: (Decimal, Decimal), fee: Decimal) -> PaperGateway<StaticBooks> {
        let book = OrderBook::from_levels(
            "yes",
            vec![PriceLevel { price: bid.0, size: bid.1 }],
            vec![PriceLevel { price: ask.0, size: ask.1 }],
            Utc::now(),
        );
        let mut books = HashMap::new();
        books.insert("yes".to_string(), book);
        PaperGateway::new(StaticBooks(books), fee)
    }

    #[tokio::test]
    async fn test_quotes() {
        let gw = gateway((dec!(0.48), dec!(100)), (dec!(0.50), dec!(100)), dec!(0));

        assert_eq!(gw.quote_ask("yes").await, Some(dec!(0.50)));
        assert_eq!(gw.quote_bid("yes").await, Some(dec!(0.48)));
        assert!(gw.quote_ask("missing").await.is_none());
        assert!(gw.orderbook_exists("yes").await);
        assert!(!gw.orderbook_exists("missing").await);
    }

    #[tokio::test]
    async fn test_buy_fills_notional() {
        let gw = gateway((dec!(0.48), dec!(100)), (dec!(0.50), dec!(100)), dec!(0.001));

        let fill = gw.place_market_order(Side::Buy, "yes", dec!(5)).await.unwrap();

        assert_eq!(fill.filled_amount, dec!(10));
        assert_eq!(fill.requested_amount, dec!(5));
        assert_eq!(fill.avg_price, dec!(0.50));
        assert_eq!(gw.holding("yes").await, dec!(10));

        let fills = gw.fills().await;
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].fees, dec!(0.005)); // 10 * 0.50 * 0.001
    }

    #[tokio::test]
    async fn test_sell_partial_fill_against_thin_bid() {
        let gw = gateway((dec!(0.55), dec!(7)), (dec!(0.40), dec!(100)), dec!(0));

        gw.place_market_order(Side::Buy, "yes", dec!(4)).await.unwrap();
        assert_eq!(gw.holding("yes").await, dec!(10));

        let fill = gw.place_market_order(Side::Sell, "yes", dec!(10)).await.unwrap();
        assert!(fill.is_partial_sell());
        assert_eq!(fill.filled_amount, dec!(7));
        assert_eq!(fill.unfilled_shares(), dec!(3));
        assert_eq!(gw.holding("yes").await, dec!(3));
    }

    #[tokio::test]
    async fn test_sell_more_than_held() {
        let gw = gateway((dec!(0.55), dec!(100)), (dec!(0.40), dec!(100)), dec!(0));

        let err = gw
            .place_market_order(Side::Sell, "yes", dec!(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExecutionErrorKind::InsufficientBalance);
    }

    #[tokio::test]
    async fn test_order_without_book() {
        let gw = gateway((dec!(0.55), dec!(100)), (dec!(0.40), dec!(100)), dec!(0));

        let err = gw
            .place_market_order(Side::Buy, "missing", dec!(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExecutionErrorKind::NoOrderbook);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let gw = gateway((dec!(0.55), dec!(100)), (dec!(0.40), dec!(100)), dec!(0));

        let err = gw
            .place_market_order(Side::Buy, "yes", dec!(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExecutionErrorKind::Rejected);
    }
}
