//! Log server REST collaborators
//!
//! Initial snapshot listing, prior log content, and downloads. Live updates
//! arrive separately through the realtime client.

mod client;
mod download;
mod types;

pub use client::ApiClient;
pub use download::{default_download_path, download_log};
pub use types::{
    parse_timestamp, ApiError, LogChunkEvent, LogMetadata, LogSummary, NewLogEvent,
    TIMESTAMP_FORMAT,
};

use async_trait::async_trait;

/// Source of log listings and log content
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Snapshot of all known logs, most recently active first
    async fn list_logs(&self) -> Result<Vec<LogSummary>, ApiError>;

    /// Full prior content of one log
    async fn fetch_log(&self, token: &str) -> Result<String, ApiError>;
}
