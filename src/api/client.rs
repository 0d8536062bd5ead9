//! HTTP client for the log server

use super::types::{ApiError, LogSummary};
use super::LogSource;
use crate::config::ServerConfig;
use async_trait::async_trait;
use std::time::Duration;

/// REST client for log listings and content
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    list_path: String,
    log_path: String,
}

impl ApiClient {
    /// Create a client for the configured server
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            list_path: config.list_path.clone(),
            log_path: config.log_path.trim_end_matches('/').to_string(),
        })
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_url(&self) -> String {
        format!("{}{}", self.base_url, self.list_path)
    }

    fn log_url(&self, token: &str) -> Result<String, ApiError> {
        if token.is_empty() || token.contains('/') || token.contains('?') || token.contains('#') {
            return Err(ApiError::InvalidToken(token.to_string()));
        }
        Ok(format!("{}{}/{}", self.base_url, self.log_path, token))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, %status, "Log server request failed");
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LogSource for ApiClient {
    async fn list_logs(&self) -> Result<Vec<LogSummary>, ApiError> {
        let url = self.list_url();
        let logs: Vec<LogSummary> = self.get(&url).await?.json().await?;
        tracing::debug!(count = logs.len(), "Fetched log listing");
        Ok(logs)
    }

    async fn fetch_log(&self, token: &str) -> Result<String, ApiError> {
        let url = self.log_url(token)?;
        let content = self.get(&url).await?.text().await?;
        tracing::debug!(token, bytes = content.len(), "Fetched log content");
        Ok(content)
    }
}
