mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{BandwidthCommandHandler, Cli, Commands, WatchCommandHandler};
use throughput_watcher::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Bandwidth {
            file,
            interval,
            json,
            human,
        } => {
            let mut handler = BandwidthCommandHandler::new(&settings.bandwidth, interval);
            handler.handle_bandwidth_command(file, json, human)?;
        }
        Commands::Watch {
            interfaces,
            interval,
            timestamp,
            output,
            duration,
        } => {
            let handler = WatchCommandHandler::new(settings.watcher);
            handler
                .handle_watch_command(interfaces, interval, timestamp, output, duration)
                .await?;
        }
    }

    Ok(())
}
