//! Download command implementation

use crate::api::{download_log, ApiClient};
use crate::config::Config;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Log id to download (the LOG ID column of `list`)
    pub token: String,

    /// Output file (defaults to log_<token>.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DownloadArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let api = ApiClient::new(&config.server)?;
        let path = download_log(&api, &self.token, self.output.clone()).await?;
        println!("Saved {}", path.display());
        Ok(())
    }
}
