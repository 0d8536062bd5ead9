//! REST payload types and typed realtime events

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server timestamp layout, e.g. `01/30/2025 - 16:33:56.470`
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y - %H:%M:%S%.3f";

/// Parse a server timestamp
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// Game server details attached to a log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogMetadata {
    #[serde(default)]
    pub server_instance_token: String,
    #[serde(default)]
    pub game_map: String,
    #[serde(default)]
    pub steam_id: String,
    #[serde(default)]
    pub server_addr: String,
}

/// One entry of the log listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub log_id: String,
    pub server_instance_token: String,
    #[serde(default)]
    pub log_start_time: String,
    #[serde(default)]
    pub metadata: LogMetadata,
    #[serde(default)]
    pub last_activity: String,
}

impl LogSummary {
    pub fn last_activity_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.last_activity)
    }

    pub fn started_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.log_start_time)
    }
}

/// `new_log` broadcast
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewLogEvent {
    pub token: String,
    pub payload: LogSummary,
}

/// `log_chunk` broadcast: text appended to the log identified by `token`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogChunkEvent {
    pub token: String,
    pub payload: String,
}

/// REST client errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Invalid log token: {0:?}")]
    InvalidToken(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
