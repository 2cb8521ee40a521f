//! Configuration types for swing-bot
//!
//! Every field has a default, so an empty file is a valid paper-trading
//! configuration. Credentials never live in the file; they come from the
//! environment (optionally via `.env`).

use crate::bot::BotConfig;
use crate::feed::{CoinbaseConfig, COINBASE_WS_URL};
use crate::market::{GammaConfig, GAMMA_API_URL};
use crate::orderbook::{ClobConfig, CLOB_API_URL};
use crate::position::{ControllerConfig, EntryGate, ExitRules};
use crate::selector::SelectorConfig;
use crate::signal::{DetectorConfig, MAX_WINDOW_SECONDS};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the signing key
pub const PRIVATE_KEY_VAR: &str = "POLYMARKET_PRIVATE_KEY";
/// Environment variable holding the funder address
pub const FUNDER_VAR: &str = "POLYMARKET_FUNDER";

/// Configuration errors; all are fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("Malformed private key")]
    InvalidPrivateKey,
    #[error("Malformed funder address: {0}")]
    InvalidFunder(String),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub market: MarketConfig,
    pub selector: SelectorSection,
    pub signal: SignalConfig,
    pub trading: TradingConfig,
    pub exit: ExitConfig,
    pub risk: RiskConfig,
    pub execution: ExecutionConfig,
    pub shutdown: ShutdownConfig,
    pub telemetry: TelemetryConfig,
}

/// Reference price feed configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub ws_url: String,
    pub product_id: String,
    pub reconnect_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: COINBASE_WS_URL.to_string(),
            product_id: "BTC-USD".to_string(),
            reconnect_delay_ms: 2000,
        }
    }
}

/// Market discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Event slug prefix; the ET month and day are appended
    pub slug_prefix: String,
    pub gamma_url: String,
    pub clob_url: String,
    pub refresh_interval_secs: u64,
    /// Retry delay while no market has been resolved
    pub refresh_retry_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            slug_prefix: "bitcoin-price-on".to_string(),
            gamma_url: GAMMA_API_URL.to_string(),
            clob_url: CLOB_API_URL.to_string(),
            refresh_interval_secs: 3600,
            refresh_retry_secs: 60,
            request_timeout_secs: 10,
        }
    }
}

/// Threshold selection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorSection {
    pub bucket_width: Decimal,
    pub tolerance_percent: Decimal,
    pub retarget_offset: Decimal,
}

impl Default for SelectorSection {
    fn default() -> Self {
        let defaults = SelectorConfig::default();
        Self {
            bucket_width: defaults.bucket_width,
            tolerance_percent: defaults.tolerance_percent,
            retarget_offset: defaults.retarget_offset,
        }
    }
}

/// Swing detection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Minimum high/low spread in percent
    pub threshold_percent: Decimal,
    pub window_seconds: u64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            threshold_percent: dec!(0.10),
            window_seconds: 15,
        }
    }
}

/// Entry sizing and timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Notional per entry
    pub order_size: Decimal,
    pub cooldown_secs: u64,
    pub monitor_delay_secs: u64,
    pub monitor_interval_secs: u64,
    pub quote_retry_delay_secs: u64,
    pub partial_fill_retry_ms: u64,
    pub error_retry_delay_secs: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            order_size: dec!(5.0001),
            cooldown_secs: 30,
            monitor_delay_secs: 5,
            monitor_interval_secs: 5,
            quote_retry_delay_secs: 5,
            partial_fill_retry_ms: 2500,
            error_retry_delay_secs: 5,
        }
    }
}

/// Exit thresholds, percents are signed
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExitConfig {
    pub profit_target_percent: Decimal,
    pub stop_loss_tight_percent: Decimal,
    pub stop_loss_loose_percent: Decimal,
    /// Residual value below which a partially exited position is closed
    pub dust_threshold: Decimal,
}

impl Default for ExitConfig {
    fn default() -> Self {
        let rules = ExitRules::default();
        Self {
            profit_target_percent: rules.profit_target_percent,
            stop_loss_tight_percent: rules.stop_loss_tight_percent,
            stop_loss_loose_percent: rules.stop_loss_loose_percent,
            dust_threshold: dec!(0.5),
        }
    }
}

/// Pre-entry risk gate
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub risk_price_floor: Decimal,
    pub max_entry_price: Decimal,
    pub deep_loss_bound: Decimal,
    pub deep_loss_bound_risky: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let gate = EntryGate::default();
        Self {
            risk_price_floor: gate.risk_price_floor,
            max_entry_price: gate.max_entry_price,
            deep_loss_bound: gate.deep_loss_bound,
            deep_loss_bound_risky: gate.deep_loss_bound_risky,
        }
    }
}

/// Execution configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Fee charged on simulated fills
    pub fee_rate: Decimal,
    /// 0: EOA, 1: proxy wallet, 2: Gnosis Safe
    pub signature_type: u8,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Paper,
            fee_rate: Decimal::ZERO,
            signature_type: 1,
        }
    }
}

/// Execution mode: paper trading or live
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Paper,
    Live,
}

/// Shutdown behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Keep monitoring an open position until flat
    pub drain_on_shutdown: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_on_shutdown: true,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus endpoint port; disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

/// Venue credentials for live trading
#[derive(Clone)]
pub struct Credentials {
    pub private_key: String,
    pub funder: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"<redacted>")
            .field("funder", &self.funder)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let private_key = std::env::var(PRIVATE_KEY_VAR).unwrap_or_default();
        let funder = std::env::var(FUNDER_VAR).unwrap_or_default();
        Self::new(private_key, funder)
    }

    /// Validate and build credentials
    pub fn new(private_key: String, funder: String) -> Result<Self, ConfigError> {
        if private_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(PRIVATE_KEY_VAR));
        }
        if funder.trim().is_empty() {
            return Err(ConfigError::MissingCredential(FUNDER_VAR));
        }

        let key = private_key.trim();
        if !is_hex(key.strip_prefix("0x").unwrap_or(key), 64) {
            return Err(ConfigError::InvalidPrivateKey);
        }

        let address = funder.trim();
        match address.strip_prefix("0x") {
            Some(hex) if is_hex(hex, 40) => {}
            _ => return Err(ConfigError::InvalidFunder(address.to_string())),
        }

        Ok(Self {
            private_key: key.to_string(),
            funder: address.to_string(),
        })
    }
}

fn is_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.chars().all(|c| c.is_ascii_hexdigit())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check value ranges and threshold ordering
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.product_id.trim().is_empty() {
            return Err(invalid("feed.product_id", "must not be empty"));
        }
        if self.market.slug_prefix.trim().is_empty() {
            return Err(invalid("market.slug_prefix", "must not be empty"));
        }
        if self.market.refresh_interval_secs == 0 {
            return Err(invalid("market.refresh_interval_secs", "must be positive"));
        }

        if self.selector.bucket_width <= Decimal::ZERO {
            return Err(invalid("selector.bucket_width", "must be positive"));
        }
        if self.selector.tolerance_percent < Decimal::ZERO {
            return Err(invalid("selector.tolerance_percent", "must not be negative"));
        }

        if self.signal.threshold_percent <= Decimal::ZERO {
            return Err(invalid("signal.threshold_percent", "must be positive"));
        }
        if self.signal.window_seconds == 0 {
            return Err(invalid("signal.window_seconds", "must be positive"));
        }
        if self.signal.window_seconds > MAX_WINDOW_SECONDS {
            return Err(invalid(
                "signal.window_seconds",
                format!("must be at most {}", MAX_WINDOW_SECONDS),
            ));
        }

        if self.trading.order_size <= Decimal::ZERO {
            return Err(invalid("trading.order_size", "must be positive"));
        }

        let exit = &self.exit;
        if exit.profit_target_percent <= Decimal::ZERO {
            return Err(invalid("exit.profit_target_percent", "must be positive"));
        }
        if exit.stop_loss_tight_percent >= Decimal::ZERO {
            return Err(invalid("exit.stop_loss_tight_percent", "must be negative"));
        }
        if exit.stop_loss_loose_percent > exit.stop_loss_tight_percent {
            return Err(invalid(
                "exit.stop_loss_loose_percent",
                format!(
                    "{} is tighter than the tight stop {}",
                    exit.stop_loss_loose_percent, exit.stop_loss_tight_percent
                ),
            ));
        }
        if exit.dust_threshold < Decimal::ZERO {
            return Err(invalid("exit.dust_threshold", "must not be negative"));
        }

        let risk = &self.risk;
        if risk.risk_price_floor <= Decimal::ZERO || risk.risk_price_floor >= Decimal::ONE {
            return Err(invalid("risk.risk_price_floor", "must be in (0, 1)"));
        }
        if risk.max_entry_price <= risk.risk_price_floor || risk.max_entry_price > Decimal::ONE {
            return Err(invalid(
                "risk.max_entry_price",
                "must be above the risk price floor and at most 1",
            ));
        }
        if risk.deep_loss_bound_risky >= Decimal::ZERO {
            return Err(invalid("risk.deep_loss_bound_risky", "must be negative"));
        }
        if risk.deep_loss_bound > risk.deep_loss_bound_risky {
            return Err(invalid(
                "risk.deep_loss_bound",
                "must not be tighter than deep_loss_bound_risky",
            ));
        }

        if self.execution.fee_rate < Decimal::ZERO || self.execution.fee_rate >= Decimal::ONE {
            return Err(invalid("execution.fee_rate", "must be in [0, 1)"));
        }
        if self.execution.signature_type > 2 {
            return Err(invalid("execution.signature_type", "must be 0, 1 or 2"));
        }

        Ok(())
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            threshold_percent: self.signal.threshold_percent,
            window_seconds: self.signal.window_seconds,
        }
    }

    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            bucket_width: self.selector.bucket_width,
            tolerance_percent: self.selector.tolerance_percent,
            retarget_offset: self.selector.retarget_offset,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            order_size: self.trading.order_size,
            monitor_delay: Duration::from_secs(self.trading.monitor_delay_secs),
            monitor_interval: Duration::from_secs(self.trading.monitor_interval_secs),
            quote_retry_delay: Duration::from_secs(self.trading.quote_retry_delay_secs),
            partial_fill_retry_delay: Duration::from_millis(self.trading.partial_fill_retry_ms),
            error_retry_delay: Duration::from_secs(self.trading.error_retry_delay_secs),
            dust_threshold: self.exit.dust_threshold,
            exit: ExitRules {
                profit_target_percent: self.exit.profit_target_percent,
                stop_loss_tight_percent: self.exit.stop_loss_tight_percent,
                stop_loss_loose_percent: self.exit.stop_loss_loose_percent,
                risk_price_floor: self.risk.risk_price_floor,
            },
            gate: EntryGate {
                max_entry_price: self.risk.max_entry_price,
                deep_loss_bound: self.risk.deep_loss_bound,
                deep_loss_bound_risky: self.risk.deep_loss_bound_risky,
                risk_price_floor: self.risk.risk_price_floor,
            },
        }
    }

    pub fn bot_config(&self) -> BotConfig {
        BotConfig {
            cooldown: Duration::from_secs(self.trading.cooldown_secs),
            refresh_interval: Duration::from_secs(self.market.refresh_interval_secs),
            refresh_retry_delay: Duration::from_secs(self.market.refresh_retry_secs),
            market_slug_prefix: self.market.slug_prefix.clone(),
            drain_on_shutdown: self.shutdown.drain_on_shutdown,
        }
    }

    pub fn gamma_config(&self) -> GammaConfig {
        GammaConfig {
            base_url: self.market.gamma_url.clone(),
            timeout: Duration::from_secs(self.market.request_timeout_secs),
        }
    }

    pub fn clob_config(&self) -> ClobConfig {
        ClobConfig {
            base_url: self.market.clob_url.clone(),
            timeout: Duration::from_secs(self.market.request_timeout_secs),
        }
    }

    pub fn feed_config(&self) -> CoinbaseConfig {
        CoinbaseConfig {
            url: self.feed.ws_url.clone(),
            product_id: self.feed.product_id.clone(),
            reconnect_delay: Duration::from_millis(self.feed.reconnect_delay_ms),
            ..Default::default()
        }
    }
}
