//! Bot flow integration tests
//!
//! Drives the bot through the public API with an in-memory feed, a fixed
//! market and paper execution over scripted order books.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swing_bot::bot::TradingBot;
use swing_bot::config::Config;
use swing_bot::execution::{PaperGateway, Side};
use swing_bot::feed::{PriceFeed, PriceObservation};
use swing_bot::market::{DiscoveryError, InstrumentDiscovery, InstrumentPair, InstrumentSet};
use swing_bot::orderbook::{BookSource, OrderBook, PriceLevel};
use swing_bot::position::{BotState, ExitReason, PositionController};
use swing_bot::selector::InstrumentSelector;
use swing_bot::signal::SignalDetector;
use tokio::sync::mpsc;

/// Top-of-book quotes per token, editable while the bot runs
#[derive(Clone, Default)]
struct SharedBooks(Arc<Mutex<HashMap<String, (Decimal, Decimal, Decimal, Decimal)>>>);

impl SharedBooks {
    /// Set bid, bid size, ask and ask size for a token
    fn set(&self, token: &str, bid: Decimal, bid_size: Decimal, ask: Decimal, ask_size: Decimal) {
        self.0
            .lock()
            .unwrap()
            .insert(token.to_string(), (bid, bid_size, ask, ask_size));
    }
}

#[async_trait]
impl BookSource for SharedBooks {
    async fn fetch_book(&self, token_id: &str) -> anyhow::Result<Option<OrderBook>> {
        let books = self.0.lock().unwrap();
        Ok(books.get(token_id).map(|&(bid, bid_size, ask, ask_size)| {
            OrderBook::from_levels(
                token_id,
                vec![PriceLevel {
                    price: bid,
                    size: bid_size,
                }],
                vec![PriceLevel {
                    price: ask,
                    size: ask_size,
                }],
                Utc::now(),
            )
        }))
    }
}

struct FixedMarket(InstrumentSet);

impl FixedMarket {
    fn new(labels: &[&str]) -> Self {
        Self(
            labels
                .iter()
                .map(|l| {
                    (
                        l.to_string(),
                        InstrumentPair {
                            yes: format!("yes-{}", l),
                            no: format!("no-{}", l),
                        },
                    )
                })
                .collect(),
        )
    }
}

#[async_trait]
impl InstrumentDiscovery for FixedMarket {
    async fn fetch_instruments(&self, _market_key: &str) -> Result<InstrumentSet, DiscoveryError> {
        Ok(self.0.clone())
    }
}

struct ChannelFeed(Mutex<Option<mpsc::Receiver<PriceObservation>>>);

#[async_trait]
impl PriceFeed for ChannelFeed {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PriceObservation>> {
        self.0
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow::anyhow!("already subscribed"))
    }
}

type Gateway = PaperGateway<SharedBooks>;

fn build(
    books: SharedBooks,
    market: FixedMarket,
) -> (TradingBot<Gateway, FixedMarket>, Arc<Gateway>) {
    let mut config = Config::default();
    config.trading.order_size = dec!(5);
    config.validate().unwrap();

    let gateway = Arc::new(PaperGateway::new(books, Decimal::ZERO));
    let bot = TradingBot::new(
        config.bot_config(),
        SignalDetector::new(config.detector_config()),
        InstrumentSelector::new(config.selector_config()),
        Arc::new(market),
        PositionController::new(config.controller_config(), gateway.clone()),
    );
    (bot, gateway)
}

fn at(price: Decimal, offset_secs: i64) -> PriceObservation {
    let base: DateTime<Utc> = "2025-10-18T14:00:00Z".parse().unwrap();
    PriceObservation::new(price, base + chrono::Duration::seconds(offset_secs))
}

#[tokio::test(start_paused = true)]
async fn test_swing_entry_partial_exit_and_close() {
    let books = SharedBooks::default();
    books.set("yes-104000", dec!(0.49), dec!(100), dec!(0.50), dec!(100));
    books.set("no-104000", dec!(0.49), dec!(100), dec!(0.51), dec!(100));

    let (mut bot, gateway) = build(books.clone(), FixedMarket::new(&["104000", "106000"]));
    let handle = bot.handle();

    let (tx, rx) = mpsc::channel(16);
    let feed = ChannelFeed(Mutex::new(Some(rx)));
    let run = tokio::spawn(async move { bot.run(&feed).await });

    tx.send(at(dec!(104000), 0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    tx.send(at(dec!(104200), 2)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // 5 / 0.50
    assert_eq!(gateway.holding("yes-104000").await, dec!(10));

    // take profit, but only 6 shares bid at the top
    books.set("yes-104000", dec!(0.56), dec!(6), dec!(0.57), dec!(100));
    tokio::time::sleep(Duration::from_millis(5500)).await;
    assert_eq!(gateway.holding("yes-104000").await, dec!(4));

    books.set("yes-104000", dec!(0.56), dec!(100), dec!(0.57), dec!(100));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(gateway.holding("yes-104000").await, dec!(0));

    handle.stop();
    let summary = run.await.unwrap().unwrap();

    let fills = gateway.fills().await;
    assert_eq!(fills.len(), 3);
    assert_eq!(fills[0].side, Side::Buy);
    assert_eq!(fills[1].size, dec!(6));
    assert_eq!(fills[2].size, dec!(4));

    assert_eq!(summary.signals, 1);
    assert_eq!(summary.closed_trades.len(), 1);
    let trade = &summary.closed_trades[0];
    assert_eq!(trade.reason, ExitReason::TakeProfit);
    assert_eq!(trade.realized_pnl, dec!(0.60));
    assert_eq!(summary.final_state, BotState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_missing_book_falls_back_and_drains_on_stop() {
    let books = SharedBooks::default();
    books.set("yes-106000", dec!(0.29), dec!(100), dec!(0.30), dec!(100));

    let (mut bot, gateway) = build(books.clone(), FixedMarket::new(&["104000", "106000"]));
    let handle = bot.handle();

    let (tx, rx) = mpsc::channel(16);
    let feed = ChannelFeed(Mutex::new(Some(rx)));
    let run = tokio::spawn(async move {
        let summary = bot.run(&feed).await;
        (bot, summary)
    });

    tx.send(at(dec!(104000), 0)).await.unwrap();
    tx.send(at(dec!(104200), 2)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let held = gateway.holding("yes-106000").await;
    assert!(held > Decimal::ZERO);

    // inside the band, so the drain keeps monitoring
    handle.stop();
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(!run.is_finished());
    assert_eq!(gateway.holding("yes-106000").await, held);

    books.set("yes-106000", dec!(0.35), dec!(100), dec!(0.36), dec!(100));
    tokio::time::sleep(Duration::from_secs(6)).await;

    let (bot, summary) = run.await.unwrap();
    let summary = summary.unwrap();
    assert_eq!(bot.active_market().unwrap().selection.threshold, "106000");
    assert_eq!(summary.closed_trades.len(), 1);
    assert_eq!(summary.closed_trades[0].position.instrument, "yes-106000");
    assert_eq!(summary.closed_trades[0].reason, ExitReason::TakeProfit);
    assert_eq!(gateway.holding("yes-106000").await, Decimal::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_feed_end_stops_bot() {
    let (mut bot, gateway) = build(SharedBooks::default(), FixedMarket::new(&["104000"]));

    let (tx, rx) = mpsc::channel(16);
    let feed = ChannelFeed(Mutex::new(Some(rx)));

    tx.send(at(dec!(104000), 0)).await.unwrap();
    drop(tx);

    let summary = bot.run(&feed).await.unwrap();
    assert_eq!(summary.signals, 0);
    assert!(summary.closed_trades.is_empty());
    assert!(gateway.fills().await.is_empty());
    assert_eq!(bot.state(), BotState::Idle);
}
