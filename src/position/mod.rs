//! Position lifecycle
//!
//! Entry gating, exit rules and the controller state machine that applies
//! them to a single open position.

mod controller;
mod policy;
mod profit;
mod types;

pub use controller::{
    ControllerConfig, EntryError, EntryOutcome, Followup, PositionController, SkipReason,
};
pub use policy::{EntryGate, EntryVerdict, ExitDecision, ExitReason, ExitRules};
pub use profit::{calculate_profit, ProfitReport};
pub use types::{BotState, ClosedTrade, Position};
