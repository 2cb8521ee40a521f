//! Position state machine
//!
//! Owns the single open position. Entries are driven by signals, exits by
//! periodic checks; each step returns when the bot should call back.

use super::policy::{EntryGate, EntryVerdict, ExitDecision, ExitReason, ExitRules};
use super::types::{BotState, ClosedTrade, Position};
use crate::execution::{ExecutionError, ExecutionGateway, Side};
use crate::market::InstrumentPair;
use crate::selector::{leg_for_bias, Selection};
use crate::signal::{Direction, Signal};
use crate::telemetry::{self, CounterMetric, GaugeMetric, LatencyMetric};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Controller parameters
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Notional spent per entry
    pub order_size: Decimal,
    /// Delay before the first exit check after entry
    pub monitor_delay: Duration,
    /// Delay between exit checks while holding
    pub monitor_interval: Duration,
    /// Delay after a missing quote
    pub quote_retry_delay: Duration,
    /// Delay before retrying a partially filled exit
    pub partial_fill_retry_delay: Duration,
    /// Delay after a failed venue call
    pub error_retry_delay: Duration,
    /// Residual value at or below which a position is closed
    pub dust_threshold: Decimal,
    /// Exit thresholds
    pub exit: ExitRules,
    /// Pre-entry risk gate
    pub gate: EntryGate,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            order_size: dec!(5.0001),
            monitor_delay: Duration::from_secs(5),
            monitor_interval: Duration::from_secs(5),
            quote_retry_delay: Duration::from_secs(5),
            partial_fill_retry_delay: Duration::from_millis(2500),
            error_retry_delay: Duration::from_secs(5),
            dust_threshold: dec!(0.5),
            exit: ExitRules::default(),
            gate: EntryGate::default(),
        }
    }
}

/// What the bot should do after a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    /// Nothing pending
    Idle,
    /// Run another check after the delay
    CheckAfter(Duration),
    /// Position fully closed
    Closed(ClosedTrade),
}

/// Entry skipped by the risk gate
///
/// Both skips ask for a market refresh biased by `retarget`, which moves
/// selection towards cheaper legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Immediate round trip too lossy
    DeepLoss {
        profit_percent: Decimal,
        retarget: Direction,
    },
    /// Ask above the ceiling
    TooExpensive { ask: Decimal, retarget: Direction },
}

impl SkipReason {
    /// Bias for the follow-up refresh
    pub fn retarget(&self) -> Direction {
        match self {
            SkipReason::DeepLoss { retarget, .. } | SkipReason::TooExpensive { retarget, .. } => {
                *retarget
            }
        }
    }
}

/// Result of an entry attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Already holding or entering; signal ignored
    Busy,
    /// Risk gate rejected the entry
    Skipped(SkipReason),
    /// Position opened; first check after the delay
    Opened {
        position: Position,
        first_check: Duration,
    },
}

/// Entry failures; the controller is back to idle after any of them
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("No target market selected")]
    NoTarget,
    #[error("No order book for {0}")]
    NoOrderbook(String),
    #[error("No ask quote for {0}")]
    NoQuote(String),
    #[error("Entry order failed: {0}")]
    Order(#[from] ExecutionError),
    #[error("Entry order returned no order ID")]
    MissingOrderId,
    #[error("Entry order filled no shares")]
    NothingFilled,
}

#[derive(Debug, Clone)]
struct Target {
    threshold: String,
    pair: InstrumentPair,
}

/// Position controller over an execution gateway
pub struct PositionController<G: ExecutionGateway> {
    config: ControllerConfig,
    gateway: Arc<G>,
    state: BotState,
    position: Option<Position>,
    target: Option<Target>,
    realized_pnl: Decimal,
}

impl<G: ExecutionGateway> PositionController<G> {
    /// Create an idle controller
    pub fn new(config: ControllerConfig, gateway: Arc<G>) -> Self {
        Self {
            config,
            gateway,
            state: BotState::Idle,
            position: None,
            target: None,
            realized_pnl: Decimal::ZERO,
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Threshold of the current target market
    pub fn target_threshold(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.threshold.as_str())
    }

    /// Cumulative realized P&L of closed trades
    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Replace the target market used by the next entry
    ///
    /// An open position keeps trading its own instrument.
    pub fn set_target(&mut self, selection: Selection) {
        tracing::info!(
            threshold = %selection.threshold,
            yes = %selection.pair.yes,
            no = %selection.pair.no,
            "Target market updated"
        );
        self.target = Some(Target {
            threshold: selection.threshold,
            pair: selection.pair,
        });
    }

    fn set_state(&mut self, state: BotState) {
        if self.state != state {
            tracing::debug!(from = %self.state, to = %state, "State transition");
            self.state = state;
            telemetry::set_gauge(GaugeMetric::BotState, f64::from(state.ordinal()));
        }
    }

    /// Try to open a position for a signal
    pub async fn enter(&mut self, signal: &Signal) -> Result<EntryOutcome, EntryError> {
        if self.state.is_busy() {
            return Ok(EntryOutcome::Busy);
        }

        let target = self.target.clone().ok_or(EntryError::NoTarget)?;

        self.set_state(BotState::AwaitingEntryFill);
        let result = self.open(signal, target).await;
        if !matches!(result, Ok(EntryOutcome::Opened { .. })) {
            self.set_state(BotState::Idle);
        }
        result
    }

    async fn open(&mut self, signal: &Signal, target: Target) -> Result<EntryOutcome, EntryError> {
        let direction = signal.direction;
        let side = match direction {
            Direction::Up => Side::Buy,
            Direction::Down => Side::Sell,
        };
        let instrument = target.pair.leg(leg_for_bias(Some(direction))).clone();

        if !self.gateway.orderbook_exists(&instrument).await {
            return Err(EntryError::NoOrderbook(instrument));
        }

        let ask = self
            .gateway
            .quote_ask(&instrument)
            .await
            .ok_or_else(|| EntryError::NoQuote(instrument.clone()))?;
        let bid = self.gateway.quote_bid(&instrument).await;

        let order_size = self.config.order_size;
        let shares_estimate = order_size.checked_div(ask).unwrap_or(Decimal::ZERO);

        match self.config.gate.evaluate(ask, bid, shares_estimate) {
            EntryVerdict::Proceed => {}
            EntryVerdict::SkipDeepLoss { profit_percent } => {
                tracing::info!(%instrument, %ask, ?bid, %profit_percent, "Spread too wide, retargeting");
                telemetry::increment(CounterMetric::EntriesSkipped);
                return Ok(EntryOutcome::Skipped(SkipReason::DeepLoss {
                    profit_percent,
                    retarget: direction,
                }));
            }
            EntryVerdict::SkipTooExpensive { ask } => {
                tracing::info!(%instrument, %ask, "Ask above ceiling, retargeting");
                telemetry::increment(CounterMetric::EntriesSkipped);
                return Ok(EntryOutcome::Skipped(SkipReason::TooExpensive {
                    ask,
                    retarget: direction,
                }));
            }
        }

        tracing::info!(
            %direction,
            %side,
            threshold = %target.threshold,
            %instrument,
            %ask,
            %order_size,
            "Placing entry order"
        );

        let started = Instant::now();
        let fill = self
            .gateway
            .place_market_order(Side::Buy, &instrument, order_size)
            .await;
        telemetry::record_latency(LatencyMetric::OrderSubmission, started.elapsed());

        let fill = fill.inspect_err(|_| telemetry::increment(CounterMetric::ExecutionErrors))?;

        if fill.order_id.is_empty() {
            return Err(EntryError::MissingOrderId);
        }
        if fill.filled_amount <= Decimal::ZERO {
            return Err(EntryError::NothingFilled);
        }

        let entry_price = match self.gateway.quote_ask(&instrument).await {
            Some(ask) => ask,
            None => order_size
                .checked_div(fill.filled_amount)
                .unwrap_or(fill.avg_price),
        };

        let position = Position {
            direction,
            side,
            size: fill.filled_amount,
            remaining: fill.filled_amount,
            entry_price,
            cost: fill.filled_amount * fill.avg_price,
            proceeds: Decimal::ZERO,
            entry_time: Utc::now(),
            order_id: fill.order_id,
            threshold: target.threshold,
            instrument,
            exit_reason: None,
        };

        tracing::info!(
            order_id = %position.order_id,
            shares = %position.size,
            %entry_price,
            "Position opened"
        );
        telemetry::increment(CounterMetric::PositionsOpened);

        self.position = Some(position.clone());
        self.set_state(BotState::PositionOpen);

        Ok(EntryOutcome::Opened {
            position,
            first_check: self.config.monitor_delay,
        })
    }

    /// Run one monitoring step
    pub async fn check(&mut self) -> Followup {
        let Some(instrument) = self.position.as_ref().map(|p| p.instrument.clone()) else {
            self.set_state(BotState::Idle);
            return Followup::Idle;
        };

        let Some(bid) = self.gateway.quote_bid(&instrument).await else {
            tracing::warn!(%instrument, "No bid quote, retrying");
            return Followup::CheckAfter(self.config.quote_retry_delay);
        };

        match self.state {
            BotState::PositionOpen => self.evaluate(bid).await,
            BotState::UnwindingPosition => self.exit(bid).await,
            BotState::Idle | BotState::AwaitingEntryFill => Followup::Idle,
        }
    }

    async fn evaluate(&mut self, bid: Decimal) -> Followup {
        let Some(position) = self.position.as_mut() else {
            return Followup::Idle;
        };

        let (decision, report) =
            self.config
                .exit
                .decide(position.entry_price, bid, position.remaining);

        tracing::info!(
            instrument = %position.instrument,
            entry = %position.entry_price,
            %bid,
            profit = %report.profit,
            profit_percent = %report.profit_percent.round_dp(2),
            "Position check"
        );

        match decision {
            ExitDecision::Hold => Followup::CheckAfter(self.config.monitor_interval),
            ExitDecision::Exit(reason) => {
                tracing::info!(?reason, profit_percent = %report.profit_percent.round_dp(2), "Exit triggered");
                position.exit_reason = Some(reason);
                self.exit(bid).await
            }
        }
    }

    async fn exit(&mut self, bid: Decimal) -> Followup {
        self.set_state(BotState::UnwindingPosition);

        let Some(position) = self.position.as_mut() else {
            self.set_state(BotState::Idle);
            return Followup::Idle;
        };

        let remaining = position.remaining;
        let started = Instant::now();
        let result = self
            .gateway
            .place_market_order(Side::Sell, &position.instrument, remaining)
            .await;
        telemetry::record_latency(LatencyMetric::OrderSubmission, started.elapsed());

        let fill = match result {
            Ok(fill) => fill,
            Err(e) => {
                tracing::warn!(error = %e, instrument = %position.instrument, %remaining, "Exit order failed, retrying");
                telemetry::increment(CounterMetric::ExecutionErrors);
                return Followup::CheckAfter(self.config.error_retry_delay);
            }
        };

        let filled = fill.filled_amount.min(remaining).max(Decimal::ZERO);
        position.proceeds += filled * fill.avg_price;
        let residual = if fill.is_partial_sell() {
            fill.unfilled_shares().min(remaining)
        } else {
            Decimal::ZERO
        };

        if residual * bid > self.config.dust_threshold {
            position.remaining = residual;
            tracing::warn!(
                order_id = %fill.order_id,
                %filled,
                %residual,
                "Exit partially filled"
            );
            telemetry::increment(CounterMetric::PartialFills);
            return Followup::CheckAfter(self.config.partial_fill_retry_delay);
        }

        self.close(bid, residual)
    }

    fn close(&mut self, bid: Decimal, abandoned: Decimal) -> Followup {
        let Some(mut position) = self.position.take() else {
            self.set_state(BotState::Idle);
            return Followup::Idle;
        };
        position.remaining = Decimal::ZERO;

        let reason = position.exit_reason.unwrap_or(ExitReason::StopLoss);
        let realized_pnl = position.proceeds - position.cost;
        self.realized_pnl += realized_pnl;

        if abandoned > Decimal::ZERO {
            tracing::info!(%abandoned, %bid, "Residual below dust threshold, abandoning");
        }
        tracing::info!(
            ?reason,
            %realized_pnl,
            total_pnl = %self.realized_pnl,
            "Position closed"
        );
        telemetry::increment(CounterMetric::PositionsClosed);
        telemetry::set_gauge(
            GaugeMetric::RealizedPnl,
            self.realized_pnl.to_f64().unwrap_or_default(),
        );

        self.set_state(BotState::Idle);

        Followup::Closed(ClosedTrade {
            position,
            reason,
            exit_bid: bid,
            abandoned,
            realized_pnl,
            closed_at: Utc::now(),
        })
    }
}
