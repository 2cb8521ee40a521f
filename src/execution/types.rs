//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Venue order identifier
pub type OrderId = String;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy outcome tokens (amount is notional)
    Buy,
    /// Sell outcome tokens (amount is shares)
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Result of a market order accepted by the venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFill {
    /// Venue order identifier
    pub order_id: OrderId,
    /// Order side
    pub side: Side,
    /// Token traded
    pub instrument: String,
    /// Requested amount (notional for buys, shares for sells)
    pub requested_amount: Decimal,
    /// Shares actually bought or sold
    pub filled_amount: Decimal,
    /// Average fill price
    pub avg_price: Decimal,
}

impl OrderFill {
    /// Check if a sell left shares unfilled
    pub fn is_partial_sell(&self) -> bool {
        self.side == Side::Sell && self.filled_amount < self.requested_amount
    }

    /// Shares left after a sell
    pub fn unfilled_shares(&self) -> Decimal {
        match self.side {
            Side::Sell => (self.requested_amount - self.filled_amount).max(Decimal::ZERO),
            Side::Buy => Decimal::ZERO,
        }
    }
}

/// A fill recorded in the execution ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Order ID
    pub order_id: OrderId,
    /// Token ID
    pub token_id: String,
    /// Trade side
    pub side: Side,
    /// Fill price
    pub price: Decimal,
    /// Fill size in shares
    pub size: Decimal,
    /// Fill timestamp
    pub timestamp: DateTime<Utc>,
    /// Fees paid
    pub fees: Decimal,
}

/// Category of an execution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionErrorKind {
    /// Venue rejected the order
    Rejected,
    /// Not enough balance or allowance
    InsufficientBalance,
    /// No resting liquidity on the needed side
    NoLiquidity,
    /// Venue has no order book for the token
    NoOrderbook,
    /// Network or transport failure
    Transport,
    /// Any other venue error (signature, precision, ...)
    Venue,
}

/// Execution failure reported by a gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct ExecutionError {
    /// Failure category
    pub kind: ExecutionErrorKind,
    /// Venue or transport message
    pub message: String,
}

impl ExecutionError {
    /// Create a new error
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a free-form venue error message
    pub fn from_venue_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        let kind = if lower.contains("not enough balance")
            || lower.contains("insufficient")
            || lower.contains("allowance")
        {
            ExecutionErrorKind::InsufficientBalance
        } else if lower.contains("no orders found to match") || lower.contains("no liquidity") {
            ExecutionErrorKind::NoLiquidity
        } else if lower.contains("does not exist") || lower.contains("orderbook") {
            ExecutionErrorKind::NoOrderbook
        } else {
            ExecutionErrorKind::Venue
        };

        Self { kind, message }
    }

    /// Transport error
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::new(ExecutionErrorKind::Transport, err.to_string())
    }
}
