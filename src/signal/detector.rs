//! Sliding-window swing detector
//!
//! Measures the high/low spread of the window and reports a signal when it
//! exceeds the configured percent threshold. Direction comes from the window
//! endpoints (oldest vs newest), not from where the high and low occurred.

use super::types::{Direction, Signal};
use super::window::PriceWindow;
use crate::feed::PriceObservation;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Configuration for swing detection
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum high/low spread in percent (0.10 = 0.1%)
    pub threshold_percent: Decimal,
    /// Window length in seconds
    pub window_seconds: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_percent: dec!(0.10),
            window_seconds: 15,
        }
    }
}

/// Swing detector built on a [`PriceWindow`]
pub struct SignalDetector {
    threshold_percent: Decimal,
    window: PriceWindow,
    last_percent_change: Option<Decimal>,
}

impl SignalDetector {
    /// Create a detector from configuration
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            threshold_percent: config.threshold_percent,
            window: PriceWindow::with_seconds(config.window_seconds),
            last_percent_change: None,
        }
    }

    /// Create a detector with default configuration
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    /// Record a price observation
    pub fn add(&mut self, observation: PriceObservation) {
        self.window.add(observation);
    }

    /// Evaluate the current window
    pub fn detect(&mut self) -> Option<Signal> {
        if self.window.len() < 2 {
            return None;
        }

        let prices = self.window.values();
        let high = prices.iter().copied().max()?;
        let low = prices.iter().copied().min()?;

        if low <= Decimal::ZERO {
            return None;
        }

        let percent_change = (high - low) / low * dec!(100);
        self.last_percent_change = Some(percent_change);

        if percent_change <= self.threshold_percent {
            return None;
        }

        let oldest = self.window.oldest()?.price;
        let newest = self.window.latest()?.price;
        let direction = if newest >= oldest {
            Direction::Up
        } else {
            Direction::Down
        };

        tracing::debug!(
            %direction,
            %percent_change,
            %low,
            %high,
            samples = prices.len(),
            "Swing detected"
        );

        Some(Signal {
            direction,
            low_price: low,
            high_price: high,
            percent_change,
            timestamp: Utc::now(),
        })
    }

    /// Spread computed by the most recent evaluation with enough data
    pub fn last_percent_change(&self) -> Option<Decimal> {
        self.last_percent_change
    }

}
