//! swing-bot: Momentum swing trading bot for Polymarket daily BTC
//! price-threshold markets
//!
//! This library provides the core components for:
//! - Real-time reference price from the Coinbase ticker
//! - Sliding-window swing detection
//! - Threshold market discovery via the Gamma API
//! - Threshold bucket and instrument selection
//! - Order book quoting and paper execution against the CLOB
//! - Single-position entry gating, exit monitoring and partial-fill unwinding
//! - Signal-driven orchestration on a single task queue
//! - Logging and Prometheus metrics

pub mod bot;
pub mod cli;
pub mod config;
pub mod execution;
pub mod feed;
pub mod market;
pub mod orderbook;
pub mod position;
pub mod selector;
pub mod signal;
pub mod telemetry;
