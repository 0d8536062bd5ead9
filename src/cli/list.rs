//! List command implementation

use crate::api::{ApiClient, LogSource, LogSummary};
use crate::config::Config;
use clap::Args;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let api = ApiClient::new(&config.server)?;
        let logs = api.list_logs().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&logs)?);
            return Ok(());
        }
        if logs.is_empty() {
            println!("No logs found.");
            return Ok(());
        }

        println!(
            "{:<36} {:<24} {:<14} {:<18} {:<22} {}",
            "LOG ID", "SERVER INSTANCE", "MAP", "STEAM ID", "SERVER ADDRESS", "LAST ACTIVITY"
        );
        for log in &logs {
            println!("{}", format_row(log));
        }
        Ok(())
    }
}

/// One table row for a log summary. The log id leads: it is what `tail`
/// and `download` take, and what `log_chunk` frames are tagged with.
pub fn format_row(log: &LogSummary) -> String {
    format!(
        "{:<36} {:<24} {:<14} {:<18} {:<22} {}",
        log.log_id,
        log.server_instance_token,
        log.metadata.game_map,
        log.metadata.steam_id,
        log.metadata.server_addr,
        log.last_activity
    )
}
