//! Threshold bucket and instrument selection
//!
//! Maps the reference price to the threshold market to trade. Thresholds
//! are bucketed by `bucket_width`; when the price sits within
//! `tolerance_percent` of a bucket edge the neighbouring bucket is preferred,
//! otherwise the bucket floor. Labels missing from the event fall back to
//! the nearest available threshold.

use crate::execution::ExecutionGateway;
use crate::market::{InstrumentPair, InstrumentSet, Leg};
use crate::signal::Direction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use thiserror::Error;

/// Selection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The instrument set was empty
    #[error("No thresholds available")]
    NoThresholds,
    /// Every candidate failed the order book check
    #[error("No tradable instrument found")]
    NoTradableInstrument,
}

/// Selection policy parameters
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Distance between threshold buckets
    pub bucket_width: Decimal,
    /// Edge tolerance as percent of the reference price
    pub tolerance_percent: Decimal,
    /// Reference price shift applied when re-targeting with a bias
    pub retarget_offset: Decimal,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            bucket_width: dec!(100),
            tolerance_percent: dec!(0.5),
            retarget_offset: dec!(2000),
        }
    }
}

/// A resolved target: threshold, its pair and the leg to trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Threshold label as published by the venue
    pub threshold: String,
    /// Instrument pair for the threshold
    pub pair: InstrumentPair,
    /// Leg whose order book was verified; yes unless the refresh was biased down
    ///
    /// Entries pick their own leg from the signal direction, so this only
    /// decides which book the refresh checks.
    pub leg: Leg,
}

impl Selection {
    /// Token of the selected leg
    pub fn instrument(&self) -> &str {
        self.pair.leg(self.leg)
    }
}

/// Leg to target for a directional bias; yes when unbiased
pub fn leg_for_bias(bias: Option<Direction>) -> Leg {
    match bias {
        Some(Direction::Down) => Leg::No,
        Some(Direction::Up) | None => Leg::Yes,
    }
}

/// Threshold selector
#[derive(Debug, Clone, Default)]
pub struct InstrumentSelector {
    config: SelectorConfig,
}

impl InstrumentSelector {
    /// Create a selector with the given policy
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Policy parameters
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Pick the threshold bucket for a reference price
    pub fn select_threshold<'a, I>(&self, reference_price: Decimal, available: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available = parse_labels(available);
        if available.is_empty() {
            return None;
        }

        let width = self.config.bucket_width;
        let lower = (reference_price / width).floor() * width;
        let upper = lower + width;
        let tolerance = reference_price * self.config.tolerance_percent / dec!(100);

        let mut candidates = Vec::with_capacity(2);
        if reference_price - lower <= tolerance {
            candidates.push(lower - width);
        }
        if upper - reference_price <= tolerance {
            candidates.push(upper);
        }
        if candidates.is_empty() {
            candidates.push(lower);
        }

        for candidate in &candidates {
            if let Some((label, _)) = available.iter().find(|(_, value)| value == candidate) {
                return Some(label.clone());
            }
        }

        rank_by_distance(available, reference_price)
            .into_iter()
            .next()
            .map(|(label, _)| label)
    }

    /// Check thresholds nearest-first and return the first with a live book
    pub async fn find_tradable_threshold<G>(
        &self,
        instruments: &InstrumentSet,
        reference_price: Decimal,
        excluded: &[String],
        leg: Leg,
        books: &G,
    ) -> Result<String, SelectorError>
    where
        G: ExecutionGateway + ?Sized,
    {
        let labels = parse_labels(
            instruments
                .keys()
                .filter(|t| !excluded.contains(*t))
                .map(String::as_str),
        );

        for (threshold, distance) in rank_by_distance(labels, reference_price) {
            let Some(pair) = instruments.get(&threshold) else {
                continue;
            };

            if books.orderbook_exists(pair.leg(leg)).await {
                tracing::info!(%threshold, %distance, "Alternative threshold found");
                return Ok(threshold);
            }

            tracing::debug!(%threshold, "No order book, trying next threshold");
        }

        Err(SelectorError::NoTradableInstrument)
    }

    /// Full refresh policy: select, verify, fall back
    ///
    /// With a bias the reference price is shifted by `retarget_offset` in the
    /// bias direction, which moves selection towards cheaper legs. The
    /// fallback search still ranks by distance to the unshifted price.
    pub async fn resolve<G>(
        &self,
        instruments: &InstrumentSet,
        reference_price: Decimal,
        bias: Option<Direction>,
        books: &G,
    ) -> Result<Selection, SelectorError>
    where
        G: ExecutionGateway + ?Sized,
    {
        if instruments.is_empty() {
            return Err(SelectorError::NoThresholds);
        }

        let leg = leg_for_bias(bias);
        let target_price = match bias {
            Some(Direction::Up) => reference_price + self.config.retarget_offset,
            Some(Direction::Down) => reference_price - self.config.retarget_offset,
            None => reference_price,
        };

        let mut excluded = Vec::new();
        if let Some(threshold) =
            self.select_threshold(target_price, instruments.keys().map(String::as_str))
        {
            if let Some(pair) = instruments.get(&threshold) {
                if books.orderbook_exists(pair.leg(leg)).await {
                    return Ok(Selection {
                        threshold,
                        pair: pair.clone(),
                        leg,
                    });
                }
                tracing::warn!(%threshold, "Order book verification failed");
            }
            excluded.push(threshold);
        }

        let threshold = self
            .find_tradable_threshold(instruments, reference_price, &excluded, leg, books)
            .await?;
        let pair = instruments
            .get(&threshold)
            .cloned()
            .ok_or(SelectorError::NoTradableInstrument)?;

        Ok(Selection {
            threshold,
            pair,
            leg,
        })
    }
}

fn parse_labels<'a, I>(labels: I) -> Vec<(String, Decimal)>
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .filter_map(|label| {
            Decimal::from_str(label)
                .ok()
                .map(|value| (label.to_string(), value))
        })
        .collect()
}

/// Sort by distance to the price; ties go to the lower threshold
fn rank_by_distance(labels: Vec<(String, Decimal)>, price: Decimal) -> Vec<(String, Decimal)> {
    let mut ranked: Vec<(String, Decimal, Decimal)> = labels
        .into_iter()
        .map(|(label, value)| (label, value, (value - price).abs()))
        .collect();
    ranked.sort_by(|a, b| a.2.cmp(&b.2).then(a.1.cmp(&b.1)));
    ranked
        .into_iter()
        .map(|(label, _, distance)| (label, distance))
        .collect()
}
