//! Watch command implementation

use super::{format_row, run_until_interrupted};
use crate::api::{ApiClient, LogSource, NewLogEvent};
use crate::config::Config;
use crate::realtime::{RealtimeClient, SubscribeOptions, ALL_TOKENS, NEW_LOG};
use clap::Args;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Print the current listing before following
    #[arg(long)]
    pub snapshot: bool,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if self.snapshot {
            let api = ApiClient::new(&config.server)?;
            for log in api.list_logs().await? {
                println!("{}", format_row(&log));
            }
        }

        let client = RealtimeClient::connect(config.ws_config(), config.backoff_policy());
        let _new_logs =
            client.subscribe_fn(NEW_LOG, SubscribeOptions::token(ALL_TOKENS), |event| {
                let new_log: NewLogEvent = event.decode()?;
                println!("{}", format_row(&new_log.payload));
                Ok(())
            });

        tracing::info!(url = %config.server.ws_url, "Watching for new logs");
        run_until_interrupted(&client).await
    }
}
