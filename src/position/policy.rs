//! Entry gate and exit rules
//!
//! Pure decisions over quotes; the controller feeds them and acts on the
//! verdict.

use super::profit::{calculate_profit, ProfitReport};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Take-profit and stop-loss thresholds
#[derive(Debug, Clone)]
pub struct ExitRules {
    /// Exit when profit percent reaches this value
    pub profit_target_percent: Decimal,
    /// Stop loss when both quotes are above `risk_price_floor`
    pub stop_loss_tight_percent: Decimal,
    /// Stop loss otherwise
    pub stop_loss_loose_percent: Decimal,
    /// Quote level separating liquid from long-shot tokens
    pub risk_price_floor: Decimal,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            profit_target_percent: dec!(1),
            stop_loss_tight_percent: dec!(-10),
            stop_loss_loose_percent: dec!(-25),
            risk_price_floor: dec!(0.2),
        }
    }
}

/// Why a position is being exited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
}

/// Verdict of an exit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Hold,
    Exit(ExitReason),
}

impl ExitRules {
    /// Stop loss in effect for the given entry ask and current bid
    pub fn stop_loss_for(&self, ask: Decimal, bid: Decimal) -> Decimal {
        if ask > self.risk_price_floor && bid > self.risk_price_floor {
            self.stop_loss_tight_percent
        } else {
            self.stop_loss_loose_percent
        }
    }

    /// Decide whether to exit `shares` bought at `entry_ask` given the current bid
    pub fn decide(&self, entry_ask: Decimal, bid: Decimal, shares: Decimal) -> (ExitDecision, ProfitReport) {
        let report = calculate_profit(entry_ask, bid, shares);

        let decision = if report.profit_percent >= self.profit_target_percent {
            ExitDecision::Exit(ExitReason::TakeProfit)
        } else if report.profit_percent <= self.stop_loss_for(entry_ask, bid) {
            ExitDecision::Exit(ExitReason::StopLoss)
        } else {
            ExitDecision::Hold
        };

        (decision, report)
    }
}

/// Pre-entry risk gate
#[derive(Debug, Clone)]
pub struct EntryGate {
    /// Never buy above this ask
    pub max_entry_price: Decimal,
    /// Skip when the round trip loses more than this, regardless of price
    pub deep_loss_bound: Decimal,
    /// Skip when the round trip loses more than this and both quotes are above the floor
    pub deep_loss_bound_risky: Decimal,
    /// Quote level separating liquid from long-shot tokens
    pub risk_price_floor: Decimal,
}

impl Default for EntryGate {
    fn default() -> Self {
        Self {
            max_entry_price: dec!(0.6),
            deep_loss_bound: dec!(-20),
            deep_loss_bound_risky: dec!(-15),
            risk_price_floor: dec!(0.2),
        }
    }
}

/// Verdict of the entry gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryVerdict {
    Proceed,
    /// Immediate round trip would lose too much
    SkipDeepLoss { profit_percent: Decimal },
    /// Ask above the price ceiling
    SkipTooExpensive { ask: Decimal },
}

impl EntryGate {
    /// Evaluate buying `shares` at `ask` with `bid` as the immediate exit
    ///
    /// A missing bid counts as a bid of zero.
    pub fn evaluate(&self, ask: Decimal, bid: Option<Decimal>, shares: Decimal) -> EntryVerdict {
        let bid = bid.unwrap_or(Decimal::ZERO);
        let report = calculate_profit(ask, bid, shares);
        let risky = ask > self.risk_price_floor && bid > self.risk_price_floor;

        if (risky && report.profit_percent < self.deep_loss_bound_risky)
            || report.profit_percent < self.deep_loss_bound
        {
            return EntryVerdict::SkipDeepLoss {
                profit_percent: report.profit_percent,
            };
        }

        if ask > self.max_entry_price {
            return EntryVerdict::SkipTooExpensive { ask };
        }

        EntryVerdict::Proceed
    }
}
