//! Gamma API client for market discovery
//!
//! Fetches a daily price-threshold event ("Will the price of Bitcoin be above
//! $104,000 on October 18?") and maps each active market's threshold to its
//! YES/NO CLOB token pair.

use super::{DiscoveryError, InstrumentDiscovery, InstrumentPair, InstrumentSet};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Configuration for the Gamma client
#[derive(Debug, Clone)]
pub struct GammaConfig {
    /// Base URL for the Gamma API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: GAMMA_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: GammaConfig,
    client: Client,
}

impl GammaClient {
    /// Create a new Gamma API client with default configuration
    pub fn new() -> Result<Self, DiscoveryError> {
        Self::with_config(GammaConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: GammaConfig) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Configured base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl InstrumentDiscovery for GammaClient {
    async fn fetch_instruments(&self, market_key: &str) -> Result<InstrumentSet, DiscoveryError> {
        let url = format!("{}/events/slug/{}", self.config.base_url, market_key);

        tracing::debug!(url = %url, "Fetching threshold event from Gamma API");

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscoveryError::MarketNotFound(market_key.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Api { status, body });
        }

        let event: GammaEvent = response.json().await?;
        let instruments = instruments_from_event(event);

        if instruments.is_empty() {
            return Err(DiscoveryError::MarketNotFound(market_key.to_string()));
        }

        tracing::info!(
            market_key,
            thresholds = ?instruments.keys().collect::<Vec<_>>(),
            "Resolved threshold instruments"
        );

        Ok(instruments)
    }
}

/// Event response from Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaEvent {
    /// Markets within the event, one per threshold
    #[serde(default)]
    markets: Vec<GammaMarket>,
}

/// Raw market response from Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    /// Market question, carries the threshold after a `$`
    question: String,
    /// CLOB token IDs as JSON string
    clob_token_ids: Option<String>,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    closed: bool,
}

/// Collect active markets into a threshold-keyed instrument set
fn instruments_from_event(event: GammaEvent) -> InstrumentSet {
    let mut instruments = InstrumentSet::new();

    for market in event.markets {
        if !market.active || market.closed {
            tracing::debug!(question = %market.question, "Skipping inactive market");
            continue;
        }

        let Some(threshold) = parse_threshold(&market.question) else {
            tracing::debug!(question = %market.question, "No threshold in question");
            continue;
        };

        let pair = match market.clob_token_ids.as_deref().map(parse_token_ids) {
            Some(Ok(pair)) => pair,
            Some(Err(e)) => {
                tracing::warn!(error = %e, question = %market.question, "Bad clobTokenIds");
                continue;
            }
            None => continue,
        };

        instruments.insert(threshold, pair);
    }

    instruments
}

/// Extract the threshold label from a market question
///
/// "Will the price of Bitcoin be above $104,000 on October 18?" -> "104000"
fn parse_threshold(question: &str) -> Option<String> {
    let (_, after) = question.split_once('$')?;
    let label: String = after
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    let label = label.trim_end_matches('.').to_string();

    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Parse CLOB token IDs from JSON string
///
/// Format: "[\"token1\", \"token2\"]" where token1 is YES and token2 is NO
fn parse_token_ids(token_ids_str: &str) -> anyhow::Result<InstrumentPair> {
    let tokens: Vec<String> = serde_json::from_str(token_ids_str)
        .map_err(|e| anyhow::anyhow!("Failed to parse clobTokenIds: {} - {}", token_ids_str, e))?;

    if tokens.len() < 2 {
        anyhow::bail!(
            "Expected 2 token IDs, got {}: {}",
            tokens.len(),
            token_ids_str
        );
    }

    Ok(InstrumentPair {
        yes: tokens[0].clone(),
        no: tokens[1].clone(),
    })
}
