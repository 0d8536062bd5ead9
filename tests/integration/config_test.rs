//! Integration tests for configuration loading

use logwatch::config::Config;
use std::io::Write;
use std::time::Duration;
use tokio_test::assert_err;

#[test]
fn test_example_config_loads() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.server.ws_url, "ws://localhost:8081/ws");
    assert_eq!(config.backoff_policy().max_delay, Duration::from_millis(15000));
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[server]\nws_url = \"ws://dashboard:9000/ws\"\n\n[realtime]\nbase_delay_ms = 250"
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.ws_config().url, "ws://dashboard:9000/ws");
    assert_eq!(
        config.backoff_policy().delay_for_attempt(1),
        Duration::from_millis(500)
    );
}

#[test]
fn test_load_rejects_malformed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[realtime]\nbase_delay_ms = \"soon\"").unwrap();
    assert_err!(Config::load(file.path()));
}
