//! Position types

use super::policy::ExitReason;
use crate::execution::{OrderId, Side};
use crate::market::InstrumentId;
use crate::signal::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotState {
    /// Flat, ready for a signal
    #[default]
    Idle,
    /// Entry order in flight
    AwaitingEntryFill,
    /// Holding a position, monitoring for exit
    PositionOpen,
    /// Exit started, residual shares still held
    UnwindingPosition,
}

impl BotState {
    /// Check if new signals must be ignored
    pub fn is_busy(self) -> bool {
        self != BotState::Idle
    }

    /// Ordinal for the state gauge
    pub fn ordinal(self) -> u8 {
        match self {
            BotState::Idle => 0,
            BotState::AwaitingEntryFill => 1,
            BotState::PositionOpen => 2,
            BotState::UnwindingPosition => 3,
        }
    }
}

impl std::fmt::Display for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BotState::Idle => "idle",
            BotState::AwaitingEntryFill => "awaiting_entry_fill",
            BotState::PositionOpen => "position_open",
            BotState::UnwindingPosition => "unwinding_position",
        };
        f.write_str(name)
    }
}

/// An open position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Signal direction that opened the position
    pub direction: Direction,
    /// Side mapped from the direction
    pub side: Side,
    /// Shares bought
    pub size: Decimal,
    /// Shares still held
    pub remaining: Decimal,
    /// Entry price used for profit checks
    pub entry_price: Decimal,
    /// Notional spent on entry
    pub cost: Decimal,
    /// Proceeds from exit fills so far
    pub proceeds: Decimal,
    /// Entry time
    pub entry_time: DateTime<Utc>,
    /// Entry order ID
    pub order_id: OrderId,
    /// Threshold label of the traded market
    pub threshold: String,
    /// Token held
    pub instrument: InstrumentId,
    /// Set once an exit has been triggered
    pub exit_reason: Option<ExitReason>,
}

/// A fully closed position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedTrade {
    /// Position as it stood at close
    pub position: Position,
    /// What triggered the exit
    pub reason: ExitReason,
    /// Bid at the final exit
    pub exit_bid: Decimal,
    /// Shares written off as dust
    pub abandoned: Decimal,
    /// Proceeds minus cost
    pub realized_pnl: Decimal,
    /// Close time
    pub closed_at: DateTime<Utc>,
}
