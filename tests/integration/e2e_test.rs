//! Configuration integration tests

use rust_decimal_macros::dec;
use std::io::Write;
use std::time::Duration;
use swing_bot::config::{Config, ConfigError, ExecutionMode};

#[test]
fn test_config_example_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();

    config.validate().unwrap();
    assert_eq!(config.feed.product_id, "BTC-USD");
    assert_eq!(config.signal.threshold_percent, dec!(0.10));
    assert_eq!(config.trading.order_size, dec!(5.0001));
    assert_eq!(config.execution.mode, ExecutionMode::Paper);
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_example_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let example = Config::load(path).unwrap();
    let defaults = Config::default();

    let a = example.controller_config();
    let b = defaults.controller_config();
    assert_eq!(a.order_size, b.order_size);
    assert_eq!(a.monitor_interval, b.monitor_interval);
    assert_eq!(a.partial_fill_retry_delay, b.partial_fill_retry_delay);
    assert_eq!(a.exit.stop_loss_tight_percent, b.exit.stop_loss_tight_percent);
    assert_eq!(a.gate.max_entry_price, b.gate.max_entry_price);
    assert_eq!(example.bot_config().cooldown, Duration::from_secs(30));
    assert_eq!(
        example.selector_config().retarget_offset,
        defaults.selector_config().retarget_offset
    );
}

#[test]
fn test_load_from_file_and_validate() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [exit]
        profit_target_percent = 2
        stop_loss_tight_percent = -30
        stop_loss_loose_percent = -25
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.exit.profit_target_percent, dec!(2));

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field, .. } if field == "exit.stop_loss_loose_percent"));
}

#[test]
fn test_malformed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[trading\norder_size = 5").unwrap();

    assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
}
