//! Signal types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a detected swing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Newest price at or above the oldest price in the window
    Up,
    /// Newest price below the oldest price in the window
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// A detected price swing
///
/// Consumed once by the bot and never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Direction from oldest to newest observation
    pub direction: Direction,
    /// Lowest price in the window
    pub low_price: Decimal,
    /// Highest price in the window
    pub high_price: Decimal,
    /// (high - low) / low * 100
    pub percent_change: Decimal,
    /// Detection time
    pub timestamp: DateTime<Utc>,
}
