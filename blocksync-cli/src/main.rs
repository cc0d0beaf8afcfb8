mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use blocksync_core::settings::Settings;
use blocksync_core::sync::RunMode;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blocksync")]
#[command(about = "Mirror an Exchange calendar into a CalDAV calendar as anonymous busy blocks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML settings file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show every event and log each keep/add/delete decision
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the destination calendar in line with the source
    Sync {
        /// Show what would change without touching the destination
        #[arg(long)]
        dry_run: bool,
    },
    /// Show pending changes (same as `sync --dry-run`)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded .env from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to read .env"),
    }

    let settings = Settings::load(cli.config.as_deref()).context("Invalid configuration")?;
    info!(
        calendar = %settings.destination.calendar_name,
        days = settings.sync_days,
        timezone = %settings.timezone,
        "Loaded settings"
    );

    let mode = match cli.command {
        Commands::Sync { dry_run: false } => RunMode::Apply,
        Commands::Sync { dry_run: true } | Commands::Status => RunMode::DryRun,
    };

    commands::sync::run(&settings, mode, cli.verbose).await
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
