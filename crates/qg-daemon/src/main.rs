//! qgate: scheduled quality gate for pull requests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use qg_core::config::Config;
use qg_daemon::daemon::Daemon;
use qg_harness::shutdown::DrainResult;
use tracing::{error, info};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "qgate", version, about = "Scheduled quality gate for pull requests")]
struct Cli {
    /// Path to the config file (defaults to ~/.qgate/config.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single detection cycle and exit.
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone()),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    qg_telemetry::logging::init(
        "qgate",
        &config.general.log_level,
        cli.json_logs || config.general.json_logs,
    );
    info!(project = %config.general.project_name, "configuration loaded");

    let daemon = Daemon::from_config(config)?;

    if cli.once {
        let outcome = daemon.run_once().await;
        info!(?outcome, "single cycle finished");
        return Ok(());
    }

    let shutdown = daemon.shutdown_handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("received ctrl-c, shutting down");
        shutdown.trigger();
    });

    match daemon.run().await? {
        DrainResult::Drained => Ok(()),
        DrainResult::Timeout { in_flight } => {
            // A blocked tool call would keep the runtime from shutting down.
            error!(in_flight, "exiting with work still in flight");
            std::process::exit(1);
        }
    }
}
