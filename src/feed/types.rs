//! Price feed types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single reference price observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Observed price
    pub price: Decimal,
    /// Local timestamp when the observation was received
    pub timestamp: DateTime<Utc>,
}

impl PriceObservation {
    /// Create a new observation
    pub fn new(price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }

    /// Create an observation stamped with the current time
    pub fn now(price: Decimal) -> Self {
        Self::new(price, Utc::now())
    }
}
