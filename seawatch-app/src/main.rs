use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod workflow;

#[derive(Parser, Debug)]
#[command(version, about = "Simulated oceanographic sensor fleet", long_about = None)]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "seawatch-app/config.yaml")]
    config: PathBuf,

    /// Seed catalog to load when the store is empty
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Stop after this many seconds instead of waiting for a signal
    #[arg(long)]
    run_for: Option<u64>,

    /// Base seed for reproducible readings
    #[arg(long)]
    seed: Option<u64>,

    /// Mirror every persisted reading into this CSV file
    #[arg(long)]
    readings_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = config::AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {:?}", args.config))?;
    if let Some(catalog) = args.catalog {
        config.catalog_path = catalog;
    }
    if args.run_for.is_some() {
        config.run_for_secs = args.run_for;
    }
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    if args.readings_log.is_some() {
        config.readings_log = args.readings_log;
    }

    // Logs go to stderr so the report on stdout stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    workflow::run(&config).await
}
