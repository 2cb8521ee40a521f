//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Market order round trip
    OrderSubmission,
    /// Instrument discovery and selection
    Refresh,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Reference price observations received
    Observations,
    /// Signals emitted by the detector
    SignalsDetected,
    /// Signals dropped while busy or cooling down
    SignalsDropped,
    /// Entries rejected by the risk gate
    EntriesSkipped,
    /// Positions opened
    PositionsOpened,
    /// Positions fully closed
    PositionsClosed,
    /// Exit orders that left a residual
    PartialFills,
    /// Failed venue calls
    ExecutionErrors,
    /// Instrument refreshes that failed
    RefreshFailures,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Latest reference price
    ReferencePrice,
    /// Current controller state as an ordinal
    BotState,
    /// Cumulative realized P&L
    RealizedPnl,
}

impl LatencyMetric {
    fn name(self) -> &'static str {
        match self {
            LatencyMetric::OrderSubmission => "swingbot_order_submission_latency_ms",
            LatencyMetric::Refresh => "swingbot_refresh_latency_ms",
        }
    }
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::Observations => "swingbot_price_observations_total",
            CounterMetric::SignalsDetected => "swingbot_signals_detected_total",
            CounterMetric::SignalsDropped => "swingbot_signals_dropped_total",
            CounterMetric::EntriesSkipped => "swingbot_entries_skipped_total",
            CounterMetric::PositionsOpened => "swingbot_positions_opened_total",
            CounterMetric::PositionsClosed => "swingbot_positions_closed_total",
            CounterMetric::PartialFills => "swingbot_partial_fills_total",
            CounterMetric::ExecutionErrors => "swingbot_execution_errors_total",
            CounterMetric::RefreshFailures => "swingbot_refresh_failures_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::ReferencePrice => "swingbot_reference_price",
            GaugeMetric::BotState => "swingbot_state",
            GaugeMetric::RealizedPnl => "swingbot_realized_pnl_usd",
        }
    }
}

/// Start the Prometheus scrape endpoint
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!(%addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    ::metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    ::metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    ::metrics::gauge!(metric.name()).set(value);
}
