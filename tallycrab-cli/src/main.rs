use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tallycrab_core::app::{App, Collaborators};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod signal;

#[derive(Parser, Debug)]
#[command(name = "tallycrab")]
#[command(about = "Windowed word counts over an in-process topic", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(flatten)]
    overrides: config::Overrides,
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
    };
    // Snapshots go to stdout; keep logs on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = config::resolve(cli.config.as_deref(), &cli.overrides)?;
    let app = App::new(config).context("failed to start")?;
    let mut running = app.start(Collaborators::default())?;

    tokio::select! {
        result = signal::shutdown_signal() => {
            if let Err(err) = result {
                error!(error = %err, "cannot listen for termination signals");
            }
        }
        _ = running.wait_for_stop_request() => {
            warn!("consumer stopped on its own");
        }
    }

    let report = running.shutdown().await?;
    info!(
        ticks = report.producer.ticks,
        sent = report.producer.sent,
        failed = report.producer.failed,
        processed = report.consumer.processed,
        decode_errors = report.consumer.decode_errors,
        stale_writes = report.consumer.stale_writes,
        drained = report.consumer.drained,
        "shutdown complete"
    );
    Ok(())
}
