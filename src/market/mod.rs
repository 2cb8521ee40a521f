//! Market discovery module
//!
//! Resolves the daily, time-bucketed price-threshold event to its
//! threshold-keyed outcome token pairs via the Gamma API

mod gamma;
mod schedule;

pub use gamma::{GammaClient, GammaConfig, GAMMA_API_URL};
pub use schedule::{eastern_time, is_past_noon_et, market_key};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Outcome token identifier
pub type InstrumentId = String;

/// Threshold label to token pair, e.g. "104000" -> {yes, no}
pub type InstrumentSet = BTreeMap<String, InstrumentPair>;

/// The two legs of a binary threshold market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentPair {
    /// Token paying out if the threshold condition resolves true
    pub yes: InstrumentId,
    /// Token paying out if it resolves false
    pub no: InstrumentId,
}

/// One leg of an [`InstrumentPair`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Yes,
    No,
}

impl InstrumentPair {
    /// Token for the given leg
    pub fn leg(&self, leg: Leg) -> &InstrumentId {
        match leg {
            Leg::Yes => &self.yes,
            Leg::No => &self.no,
        }
    }

    /// Check if a token belongs to this pair
    pub fn contains(&self, instrument: &str) -> bool {
        self.yes == instrument || self.no == instrument
    }
}

/// Market discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No active instruments exist for the market key
    #[error("Market not found: {0}")]
    MarketNotFound(String),
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success API response
    #[error("Gamma API error: {status} - {body}")]
    Api { status: u16, body: String },
}

/// Resolves a market key to its instrument set
#[async_trait]
pub trait InstrumentDiscovery: Send + Sync {
    /// Fetch the active threshold instruments for a market key
    async fn fetch_instruments(&self, market_key: &str) -> Result<InstrumentSet, DiscoveryError>;
}
