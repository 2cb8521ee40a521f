//! Round-trip profit calculation

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Profit of buying at one price and selling at another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitReport {
    /// Absolute profit
    pub profit: Decimal,
    /// Profit relative to the cost basis, in percent
    pub profit_percent: Decimal,
}

/// Profit of a round trip of `shares` bought at `buy_price` and sold at `sell_price`
///
/// Callers pass prices in buy/sell order for their side. A zero cost basis
/// reports zero percent.
pub fn calculate_profit(buy_price: Decimal, sell_price: Decimal, shares: Decimal) -> ProfitReport {
    let cost_basis = buy_price * shares;
    let proceeds = sell_price * shares;
    let profit = proceeds - cost_basis;

    let profit_percent = profit
        .checked_div(cost_basis)
        .map(|ratio| ratio * dec!(100))
        .unwrap_or(Decimal::ZERO);

    ProfitReport {
        profit,
        profit_percent,
    }
}
