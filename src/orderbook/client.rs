//! Polymarket CLOB REST client for order book snapshots

use super::{BookSource, OrderBook, PriceLevel};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Polymarket CLOB REST base URL
pub const CLOB_API_URL: &str = "https://clob.polymarket.com";

/// Configuration for the CLOB book client
#[derive(Debug, Clone)]
pub struct ClobConfig {
    /// Base URL for the CLOB API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClobConfig {
    fn default() -> Self {
        Self {
            base_url: CLOB_API_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Reads order book snapshots from `GET /book?token_id=...`
pub struct ClobBookClient {
    config: ClobConfig,
    client: Client,
}

impl ClobBookClient {
    /// Create a client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(ClobConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClobConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl BookSource for ClobBookClient {
    async fn fetch_book(&self, token_id: &str) -> anyhow::Result<Option<OrderBook>> {
        let url = format!("{}/book", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await?;

        // The CLOB answers 404 for tokens without a book
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("CLOB book error: {} - {}", status, body);
        }

        let raw: BookResponse = response.json().await?;
        Ok(Some(raw.into_order_book(token_id)))
    }
}

/// Raw book response
#[derive(Debug, Deserialize)]
struct BookResponse {
    #[serde(default)]
    bids: Vec<BookLevel>,
    #[serde(default)]
    asks: Vec<BookLevel>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Price level as returned by the API (string encoded)
#[derive(Debug, Deserialize)]
struct BookLevel {
    price: String,
    size: String,
}

impl BookResponse {
    fn into_order_book(self, token_id: &str) -> OrderBook {
        let updated_at = self
            .timestamp
            .as_deref()
            .and_then(|t| t.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        OrderBook::from_levels(
            token_id,
            parse_levels(self.bids),
            parse_levels(self.asks),
            updated_at,
        )
    }
}

fn parse_levels(levels: Vec<BookLevel>) -> Vec<PriceLevel> {
    levels
        .into_iter()
        .filter_map(|level| {
            let price = Decimal::from_str(&level.price).ok()?;
            let size = Decimal::from_str(&level.size).ok()?;
            Some(PriceLevel { price, size })
        })
        .collect()
}
