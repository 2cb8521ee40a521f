//! Trading bot orchestration
//!
//! Owns the detector, the position controller and the task queue. A single
//! `tokio::select!` loop multiplexes price observations, the refresh timer,
//! due tasks and the shutdown signal, so only one step ever touches the
//! position at a time.

mod scheduler;

pub use scheduler::{Task, TaskQueue};

use crate::execution::ExecutionGateway;
use crate::feed::{PriceFeed, PriceObservation};
use crate::market::{market_key, InstrumentDiscovery, InstrumentSet};
use crate::position::{BotState, ClosedTrade, EntryOutcome, Followup, PositionController};
use crate::selector::{InstrumentSelector, Selection};
use crate::signal::{Direction, Signal, SignalDetector};
use crate::telemetry::{self, CounterMetric, GaugeMetric, LatencyMetric};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

/// Orchestration parameters
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Minimum time between acted-upon signals
    pub cooldown: Duration,
    /// Period of instrument refreshes
    pub refresh_interval: Duration,
    /// Retry delay when no market could be resolved yet
    pub refresh_retry_delay: Duration,
    /// Market key prefix, e.g. "bitcoin-price-on"
    pub market_slug_prefix: String,
    /// Keep monitoring an open position after stop until it is flat
    pub drain_on_shutdown: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(3600),
            refresh_retry_delay: Duration::from_secs(60),
            market_slug_prefix: "bitcoin-price-on".to_string(),
            drain_on_shutdown: true,
        }
    }
}

/// The market currently targeted for entries
#[derive(Debug, Clone)]
pub struct ActiveMarket {
    /// Market key the instruments were resolved from
    pub key: String,
    /// All thresholds of the market
    pub instruments: InstrumentSet,
    /// Selected threshold and leg
    pub selection: Selection,
}

/// Handle used to stop a running bot
#[derive(Debug, Clone)]
pub struct BotHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl BotHandle {
    /// Ask the bot to stop; it drops the feed and ends its loop
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Outcome of a bot run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Signals emitted by the detector
    pub signals: u64,
    /// Trades closed during the run
    pub closed_trades: Vec<ClosedTrade>,
    /// Realized P&L over the run
    pub realized_pnl: Decimal,
    /// State the controller was left in
    pub final_state: BotState,
}

/// Signal-driven trading bot
pub struct TradingBot<G: ExecutionGateway, D: InstrumentDiscovery> {
    config: BotConfig,
    detector: SignalDetector,
    selector: InstrumentSelector,
    discovery: Arc<D>,
    controller: PositionController<G>,
    tasks: TaskQueue,
    market: Option<ActiveMarket>,
    reference_price: Option<Decimal>,
    last_signal_at: Option<Instant>,
    shutdown: Arc<watch::Sender<bool>>,
    summary: RunSummary,
}

impl<G: ExecutionGateway, D: InstrumentDiscovery> TradingBot<G, D> {
    pub fn new(
        config: BotConfig,
        detector: SignalDetector,
        selector: InstrumentSelector,
        discovery: Arc<D>,
        controller: PositionController<G>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            detector,
            selector,
            discovery,
            controller,
            tasks: TaskQueue::new(),
            market: None,
            reference_price: None,
            last_signal_at: None,
            shutdown: Arc::new(shutdown),
            summary: RunSummary::default(),
        }
    }

    /// Handle for stopping the bot from another task
    pub fn handle(&self) -> BotHandle {
        BotHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    pub fn state(&self) -> BotState {
        self.controller.state()
    }

    pub fn controller(&self) -> &PositionController<G> {
        &self.controller
    }

    pub fn active_market(&self) -> Option<&ActiveMarket> {
        self.market.as_ref()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Subscribe to the feed and trade until stopped or the feed ends
    pub async fn run<F>(&mut self, feed: &F) -> anyhow::Result<RunSummary>
    where
        F: PriceFeed + ?Sized,
    {
        let mut shutdown = self.shutdown.subscribe();
        let mut prices = feed.subscribe().await?;

        let period = self.config.refresh_interval;
        let mut refresh = interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            cooldown_secs = self.config.cooldown.as_secs(),
            refresh_secs = period.as_secs(),
            "Trading bot started"
        );

        while !*shutdown.borrow_and_update() {
            let deadline = self.tasks.next_deadline();

            tokio::select! {
                biased;

                _ = shutdown.changed() => {}

                observation = prices.recv() => match observation {
                    Some(observation) => self.on_observation(observation),
                    None => {
                        tracing::warn!("Price feed closed");
                        break;
                    }
                },

                _ = refresh.tick() => self.request_refresh(None, Duration::ZERO),

                _ = Self::wait_for(deadline) => self.run_due_tasks().await,
            }
        }

        drop(prices);
        tracing::info!(state = %self.controller.state(), "Trading bot stopping");

        self.drain().await;

        self.summary.realized_pnl = self.controller.realized_pnl();
        self.summary.final_state = self.controller.state();
        Ok(std::mem::take(&mut self.summary))
    }

    async fn wait_for(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    fn on_observation(&mut self, observation: PriceObservation) {
        telemetry::increment(CounterMetric::Observations);
        telemetry::set_gauge(
            GaugeMetric::ReferencePrice,
            observation.price.to_f64().unwrap_or_default(),
        );

        self.reference_price = Some(observation.price);
        self.detector.add(observation);

        if self.market.is_none() && !self.tasks.has_refresh() {
            tracing::info!(price = %observation.price, "First observation, resolving market");
            self.request_refresh(None, Duration::ZERO);
        }

        if let Some(signal) = self.detector.detect() {
            self.summary.signals += 1;
            telemetry::increment(CounterMetric::SignalsDetected);
            self.handle_signal(signal);
        }
    }

    fn handle_signal(&mut self, signal: Signal) {
        if self.controller.state().is_busy() || self.tasks.has_entry() {
            tracing::debug!(direction = %signal.direction, "Busy, dropping signal");
            telemetry::increment(CounterMetric::SignalsDropped);
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.last_signal_at {
            if now.duration_since(last) < self.config.cooldown {
                tracing::debug!(direction = %signal.direction, "Cooling down, dropping signal");
                telemetry::increment(CounterMetric::SignalsDropped);
                return;
            }
        }

        tracing::info!(
            direction = %signal.direction,
            low = %signal.low_price,
            high = %signal.high_price,
            percent_change = %signal.percent_change.round_dp(4),
            "Swing detected"
        );

        self.last_signal_at = Some(now);
        self.tasks.schedule(Task::Enter(signal), Duration::ZERO);
    }

    fn request_refresh(&mut self, bias: Option<Direction>, delay: Duration) {
        self.tasks.schedule(Task::Refresh { bias }, delay);
    }

    async fn run_due_tasks(&mut self) {
        while let Some(task) = self.tasks.pop_due(Instant::now()) {
            self.execute(task).await;
        }
    }

    async fn execute(&mut self, task: Task) {
        match task {
            Task::Enter(signal) => self.enter(signal).await,
            Task::Check => {
                let followup = self.controller.check().await;
                self.apply(followup);
            }
            Task::Refresh { bias } => self.refresh(bias).await,
        }
    }

    async fn enter(&mut self, signal: Signal) {
        match self.controller.enter(&signal).await {
            Ok(EntryOutcome::Opened { first_check, .. }) => {
                self.tasks.schedule(Task::Check, first_check);
            }
            Ok(EntryOutcome::Skipped(reason)) => {
                self.request_refresh(Some(reason.retarget()), Duration::ZERO);
            }
            Ok(EntryOutcome::Busy) => {}
            Err(e) => {
                tracing::warn!(error = %e, direction = %signal.direction, "Entry failed");
            }
        }
    }

    fn apply(&mut self, followup: Followup) {
        match followup {
            Followup::CheckAfter(delay) => self.tasks.schedule(Task::Check, delay),
            Followup::Closed(trade) => self.summary.closed_trades.push(trade),
            Followup::Idle => {}
        }
    }

    async fn refresh(&mut self, bias: Option<Direction>) {
        let Some(price) = self.reference_price else {
            tracing::debug!("No reference price yet, skipping refresh");
            return;
        };

        let key = market_key(&self.config.market_slug_prefix, Utc::now());
        let started = Instant::now();
        let result = self.resolve(&key, price, bias).await;
        telemetry::record_latency(LatencyMetric::Refresh, started.elapsed());

        match result {
            Ok((instruments, selection)) => {
                tracing::info!(
                    market = %key,
                    threshold = %selection.threshold,
                    leg = ?selection.leg,
                    ?bias,
                    %price,
                    "Market refreshed"
                );
                self.controller.set_target(selection.clone());
                self.market = Some(ActiveMarket {
                    key,
                    instruments,
                    selection,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, market = %key, ?bias, "Market refresh failed");
                telemetry::increment(CounterMetric::RefreshFailures);
                if self.market.is_none() && !self.tasks.has_refresh() {
                    self.request_refresh(bias, self.config.refresh_retry_delay);
                }
            }
        }
    }

    async fn resolve(
        &self,
        key: &str,
        price: Decimal,
        bias: Option<Direction>,
    ) -> anyhow::Result<(InstrumentSet, Selection)> {
        let instruments = self.discovery.fetch_instruments(key).await?;
        let selection = self
            .selector
            .resolve(&instruments, price, bias, self.controller.gateway())
            .await?;
        Ok((instruments, selection))
    }

    /// Drive exit checks until flat, ignoring new entries and refreshes
    async fn drain(&mut self) {
        self.tasks.retain(|task| matches!(task, Task::Check));

        if !self.config.drain_on_shutdown || !self.controller.state().is_busy() {
            return;
        }

        tracing::info!(state = %self.controller.state(), "Draining open position");
        if !self.tasks.has_check() {
            self.tasks.schedule(Task::Check, Duration::ZERO);
        }

        while self.controller.state().is_busy() {
            let Some(deadline) = self.tasks.next_deadline() else {
                break;
            };
            sleep_until(deadline).await;
            self.run_due_tasks().await;
        }
    }
}
