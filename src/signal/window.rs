//! Bounded time window of recent price observations

use crate::feed::PriceObservation;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Longest supported window; longer lengths are clamped
pub const MAX_WINDOW_SECONDS: u64 = 86_400;

/// Rolling store of observations no older than `window` relative to the
/// newest timestamp seen
#[derive(Debug, Clone)]
pub struct PriceWindow {
    observations: VecDeque<PriceObservation>,
    window: Duration,
    newest: Option<DateTime<Utc>>,
}

impl PriceWindow {
    /// Create an empty window of the given length
    pub fn new(window: Duration) -> Self {
        Self {
            observations: VecDeque::new(),
            window,
            newest: None,
        }
    }

    /// Create a window from a length in seconds, at most `MAX_WINDOW_SECONDS`
    pub fn with_seconds(seconds: u64) -> Self {
        let seconds = seconds.min(MAX_WINDOW_SECONDS) as i64;
        Self::new(Duration::seconds(seconds))
    }

    /// Append an observation and drop everything older than the window
    ///
    /// The cutoff follows the newest timestamp seen so far, so a clock that
    /// steps backwards cannot keep stale observations alive.
    pub fn add(&mut self, observation: PriceObservation) {
        let newest = match self.newest {
            Some(newest) => newest.max(observation.timestamp),
            None => observation.timestamp,
        };
        self.newest = Some(newest);
        self.observations.push_back(observation);

        let cutoff = newest - self.window;
        self.observations.retain(|o| o.timestamp >= cutoff);
    }

    /// Prices ordered oldest to newest
    pub fn values(&self) -> Vec<Decimal> {
        self.observations.iter().map(|o| o.price).collect()
    }

    /// Oldest observation still in the window
    pub fn oldest(&self) -> Option<&PriceObservation> {
        self.observations.front()
    }

    /// Most recent observation
    pub fn latest(&self) -> Option<&PriceObservation> {
        self.observations.back()
    }

    /// Number of observations in the window
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the window holds no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Drop all observations
    pub fn clear(&mut self) {
        self.observations.clear();
        self.newest = None;
    }
}
