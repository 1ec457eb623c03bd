//! Command-line entry point for running a revision pass.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use asset_buster::config::{BusterConfig, DEFAULT_CONFIG_FILE};
use asset_buster::revision::RevisionBuilder;

/// Fingerprint static assets and record a cache-busting manifest.
#[derive(Parser, Debug)]
#[command(name = "asset-buster", version, about)]
struct Cli {
    /// Path to the configuration file (defaults to buster.config.json in the
    /// project root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root against which relative configuration paths resolve
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Merge into an existing manifest regardless of the configuration
    #[arg(long)]
    merge: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("asset-buster: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let project_root = match cli.project_root {
        Some(root) => root,
        None => {
            std::env::current_dir().context("failed to determine the current directory")?
        }
    };
    let config_path = cli
        .config
        .unwrap_or_else(|| project_root.join(DEFAULT_CONFIG_FILE));

    let mut config = BusterConfig::load(&config_path)?;
    if cli.merge {
        config.merge = true;
    }

    let plan = config.into_plan(&project_root)?;
    let outcome = RevisionBuilder::new(&plan).run()?;

    println!(
        "asset-buster: fingerprinted {} file(s), manifest written to {}",
        outcome.resolved,
        outcome.manifest_path.display()
    );
    Ok(())
}
