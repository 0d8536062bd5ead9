//! CLI interface for logwatch
//!
//! Provides subcommands for:
//! - `watch`: Follow new logs as they appear
//! - `tail`: Print one log and follow appended chunks
//! - `list`: Print the current log listing
//! - `download`: Save one log to disk
//! - `config`: Show effective configuration

mod download;
mod list;
mod tail;
mod watch;

pub use download::DownloadArgs;
pub use list::{format_row, ListArgs};
pub use tail::TailArgs;
pub use watch::WatchArgs;

use crate::realtime::{ConnectionStatus, RealtimeClient};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "logwatch")]
#[command(about = "Browse and follow CS2 server logs in real time")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow new logs as they appear
    Watch(WatchArgs),
    /// Print one log and follow appended chunks
    Tail(TailArgs),
    /// Print the current log listing
    List(ListArgs),
    /// Save one log to disk
    Download(DownloadArgs),
    /// Show effective configuration
    Config,
}

/// Four-state connection indicator label
pub fn status_label(status: ConnectionStatus) -> String {
    let symbol = match status {
        ConnectionStatus::Connected => "●",
        ConnectionStatus::Connecting => "◐",
        ConnectionStatus::Disconnected => "○",
        ConnectionStatus::Error => "✖",
    };
    let name = status.as_str();
    let mut chars = name.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{symbol} {capitalized}")
}

/// Report status changes on stderr until Ctrl-C, then shut the client down
async fn run_until_interrupted(client: &RealtimeClient) -> anyhow::Result<()> {
    let mut status = client.watch_status();
    eprintln!("{}", status_label(*status.borrow_and_update()));

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                eprintln!("{}", status_label(*status.borrow_and_update()));
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    client.shutdown();
    Ok(())
}
