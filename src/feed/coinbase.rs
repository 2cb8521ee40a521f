//! Coinbase Advanced Trade ticker feed

use super::{PriceFeed, PriceObservation};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Coinbase Advanced Trade WebSocket URL
pub const COINBASE_WS_URL: &str = "wss://advanced-trade-ws.coinbase.com";

/// Ticker feed configuration
#[derive(Debug, Clone)]
pub struct CoinbaseConfig {
    /// WebSocket URL
    pub url: String,
    /// Product to subscribe to, e.g. "BTC-USD"
    pub product_id: String,
    /// Fixed delay before reconnecting
    pub reconnect_delay: Duration,
    /// Interval for keepalive pings
    pub ping_interval: Duration,
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self {
            url: COINBASE_WS_URL.to_string(),
            product_id: "BTC-USD".to_string(),
            reconnect_delay: Duration::from_secs(2),
            ping_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerMessage {
    channel: String,
    #[serde(default)]
    events: Vec<TickerEvent>,
}

#[derive(Debug, Deserialize)]
struct TickerEvent {
    #[serde(default)]
    tickers: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    product_id: Option<String>,
    price: Option<String>,
}

/// Ticker feed with fixed-delay reconnect
pub struct CoinbaseFeed {
    config: CoinbaseConfig,
}

impl CoinbaseFeed {
    /// Create a feed for the given product with default settings
    pub fn new(product_id: impl Into<String>) -> Self {
        Self::with_config(CoinbaseConfig {
            product_id: product_id.into().to_uppercase(),
            ..Default::default()
        })
    }

    pub fn with_config(config: CoinbaseConfig) -> Self {
        Self { config }
    }

    pub fn product_id(&self) -> &str {
        &self.config.product_id
    }

    fn subscribe_message(product_id: &str) -> String {
        serde_json::json!({
            "type": "subscribe",
            "product_ids": [product_id],
            "channel": "ticker",
        })
        .to_string()
    }

    /// Parse a ticker channel message; the first ticker of the first event wins
    fn parse_message(msg: &str) -> Option<Decimal> {
        let message: TickerMessage = serde_json::from_str(msg).ok()?;

        if message.channel != "ticker" {
            return None;
        }

        let ticker = message.events.first()?.tickers.first()?;
        let price = Decimal::from_str(ticker.price.as_deref()?).ok()?;

        if price <= Decimal::ZERO {
            tracing::debug!(product = ?ticker.product_id, %price, "Ignoring non-positive price");
            return None;
        }

        Some(price)
    }

    /// Reconnect forever until the receiver is dropped
    async fn run(config: CoinbaseConfig, tx: mpsc::Sender<PriceObservation>) {
        let mut received: u64 = 0;

        loop {
            match Self::connect_and_stream(&config, &tx, &mut received).await {
                Ok(()) => {
                    tracing::info!("Price receiver dropped, stopping feed");
                    return;
                }
                Err(e) => {
                    if tx.is_closed() {
                        return;
                    }
                    tracing::warn!(
                        error = %e,
                        delay_ms = config.reconnect_delay.as_millis() as u64,
                        "Coinbase feed disconnected, reconnecting"
                    );
                    tokio::time::sleep(config.reconnect_delay).await;
                }
            }
        }
    }

    /// Connect, subscribe and forward prices
    ///
    /// Returns `Ok` only when the receiver is gone.
    async fn connect_and_stream(
        config: &CoinbaseConfig,
        tx: &mpsc::Sender<PriceObservation>,
        received: &mut u64,
    ) -> anyhow::Result<()> {
        let (ws_stream, _response) = connect_async(&config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        write
            .send(Message::Text(Self::subscribe_message(&config.product_id)))
            .await?;
        tracing::info!(product = %config.product_id, "Connected to Coinbase ticker feed");

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let Some(price) = Self::parse_message(&text) else {
                                continue;
                            };
                            *received += 1;
                            if *received % 10 == 0 {
                                tracing::debug!(%price, received = *received, "Ticker");
                            }
                            if tx.send(PriceObservation::now(price)).await.is_err() {
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            anyhow::bail!("Server closed connection: {:?}", frame);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => anyhow::bail!("Stream ended unexpectedly"),
                    }
                }

                _ = tx.closed() => return Ok(()),

                _ = ping_interval.tick() => {
                    write.send(Message::Ping(vec![])).await?;
                }
            }
        }
    }
}

#[async_trait]
impl PriceFeed for CoinbaseFeed {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PriceObservation>> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        tracing::info!(product = %config.product_id, url = %config.url, "Subscribing to Coinbase feed");

        tokio::spawn(Self::run(config, tx));

        Ok(rx)
    }
}
