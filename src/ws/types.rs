//! WebSocket types and configuration

use std::time::Duration;

/// Shortest accepted timeout or interval; zero would spin or panic the socket task
pub(crate) const MIN_DURATION: Duration = Duration::from_millis(1);

/// Clamp a configured duration up to [`MIN_DURATION`]
pub(crate) fn non_zero(d: Duration) -> Duration {
    d.max(MIN_DURATION)
}

/// WebSocket transport configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Upper bound on the opening handshake
    pub connect_timeout: Duration,
    /// Interval for sending ping frames
    pub ping_interval: Duration,
    /// Timeout for pong response
    pub pong_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the handshake timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = non_zero(d);
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = non_zero(d);
        self
    }

    /// Set pong timeout
    pub fn pong_timeout(mut self, d: Duration) -> Self {
        self.pong_timeout = non_zero(d);
        self
    }
}

/// WebSocket errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum WsError {
    /// Handshake or stream failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Handshake did not finish in time
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),
    /// Server stopped answering pings
    #[error("No pong received within {0:?}")]
    PongTimeout(Duration),
    /// Writing a frame failed
    #[error("Send failed: {0}")]
    SendFailed(String),
}
