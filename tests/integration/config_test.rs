//! The shipped example configuration must stay loadable

use std::time::Duration;
use tickerwatch::config::Config;

#[test]
fn test_config_example_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.markets.timing().market_idle, Duration::from_millis(100));
    assert_eq!(config.markets.timing().worker_idle, Duration::from_millis(300));
    assert!(config.finnhub.rest_url.starts_with("https://"));
    assert!(config.coinbase.ws_url.starts_with("wss://"));
}

#[test]
fn test_config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[telemetry]\nlog_level = \"debug\"\nlog_file = false\n").unwrap();

    let config = tokio_test::assert_ok!(Config::load(&path));
    assert_eq!(config.telemetry.log_level, "debug");
    assert!(!config.telemetry.log_file);
    assert_eq!(config.stream.max_reconnect_attempts, 10);
}

#[test]
fn test_config_load_rejects_unknown_log_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[telemetry]\nlog_format = \"xml\"\n").unwrap();

    tokio_test::assert_err!(Config::load(&path));
}
