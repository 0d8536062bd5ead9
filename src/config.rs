//! Configuration types for logwatch

use crate::realtime::BackoffPolicy;
use crate::telemetry::LogFormat;
use crate::ws::WsConfig;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Log server endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Realtime event stream endpoint
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Path of the log snapshot listing
    #[serde(default = "default_list_path")]
    pub list_path: String,

    /// Path prefix for a single log's content (`{log_path}/{token}`)
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Timeout for REST requests (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8081".to_string()
}
fn default_ws_url() -> String {
    "ws://localhost:8081/ws".to_string()
}
fn default_list_path() -> String {
    "/api/listlogs".to_string()
}
fn default_log_path() -> String {
    "/api/logs".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            list_path: default_list_path(),
            log_path: default_log_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Realtime connection and reconnect tuning
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// First reconnect delay (milliseconds), doubled per failed attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Reconnect delay cap (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Handshake timeout (seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Keepalive ping interval (seconds)
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Pong wait before the socket is considered dead (seconds)
    #[serde(default = "default_pong_timeout_secs")]
    pub pong_timeout_secs: u64,
}

fn default_base_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    15000
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_pong_timeout_secs() -> u64 {
    10
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            pong_timeout_secs: default_pong_timeout_secs(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// WebSocket settings for the realtime transport
    pub fn ws_config(&self) -> WsConfig {
        WsConfig::new(&self.server.ws_url)
            .connect_timeout(Duration::from_secs(self.realtime.connect_timeout_secs))
            .ping_interval(Duration::from_secs(self.realtime.ping_interval_secs))
            .pong_timeout(Duration::from_secs(self.realtime.pong_timeout_secs))
    }

    /// Reconnect delay sequence
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.realtime.base_delay_ms),
            Duration::from_millis(self.realtime.max_delay_ms),
        )
    }
}
