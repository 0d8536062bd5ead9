//! Save a log to disk

use super::types::ApiError;
use super::LogSource;
use std::path::PathBuf;

/// `log_<token>.txt` in the current directory
pub fn default_download_path(token: &str) -> PathBuf {
    let name: String = token
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let name = if name.is_empty() { "unknown".to_string() } else { name };
    PathBuf::from(format!("log_{name}.txt"))
}

/// Fetch a log's full content and write it to `path` (or the default path)
pub async fn download_log(
    source: &dyn LogSource,
    token: &str,
    path: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    let content = source.fetch_log(token).await?;
    let path = path.unwrap_or_else(|| default_download_path(token));
    tokio::fs::write(&path, content.as_bytes()).await?;
    tracing::info!(token, path = %path.display(), bytes = content.len(), "Log downloaded");
    Ok(path)
}
