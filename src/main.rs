use clap::Parser;
use logwatch::cli::{Cli, Commands};
use logwatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _telemetry = logwatch::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Watch(args) => {
            tracing::info!("Starting watch mode");
            args.execute(&config).await?;
        }
        Commands::Tail(args) => {
            tracing::info!(token = %args.token, "Starting tail mode");
            args.execute(&config).await?;
        }
        Commands::List(args) => {
            args.execute(&config).await?;
        }
        Commands::Download(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  API: {}", config.server.base_url);
            println!("  Stream: {}", config.server.ws_url);
            println!(
                "  Reconnect: base={}ms, max={}ms",
                config.realtime.base_delay_ms, config.realtime.max_delay_ms
            );
            println!(
                "  Keepalive: ping={}s, pong timeout={}s",
                config.realtime.ping_interval_secs, config.realtime.pong_timeout_secs
            );
            match config.telemetry.metrics_port {
                Some(port) => println!("  Metrics: :{}", port),
                None => println!("  Metrics: disabled"),
            }
        }
    }

    Ok(())
}
