//! Tail command implementation

use super::run_until_interrupted;
use crate::api::{ApiClient, LogChunkEvent, LogSource};
use crate::config::Config;
use crate::realtime::{RealtimeClient, SubscribeOptions, LOG_CHUNK};
use clap::Args;
use std::io::Write;

#[derive(Args, Debug)]
pub struct TailArgs {
    /// Log id to follow (the LOG ID column of `list`)
    pub token: String,

    /// Skip printing the existing content
    #[arg(long)]
    pub no_history: bool,
}

impl TailArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if !self.no_history {
            let api = ApiClient::new(&config.server)?;
            let content = api.fetch_log(&self.token).await?;
            print!("{}", content);
            std::io::stdout().flush()?;
        }

        let client = RealtimeClient::connect(config.ws_config(), config.backoff_policy());
        let token = self.token.clone();
        let _chunks = client.subscribe_fn(
            LOG_CHUNK,
            SubscribeOptions::token(self.token.clone()),
            move |event| {
                let chunk: LogChunkEvent = event.decode()?;
                if let Some(text) = chunk_for(&token, &chunk) {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(text.as_bytes())?;
                    stdout.flush()?;
                }
                Ok(())
            },
        );

        tracing::info!(token = %self.token, "Following log");
        run_until_interrupted(&client).await
    }
}

/// Text to append for `token`, newline-terminated; other logs' chunks yield nothing
fn chunk_for(token: &str, chunk: &LogChunkEvent) -> Option<String> {
    if chunk.token != token {
        return None;
    }
    let mut text = chunk.payload.clone();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Some(text)
}
