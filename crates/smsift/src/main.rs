// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! smsift - a continuously running SMS spam classification agent.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smsift_config::model::SmsiftConfig;
use smsift_core::SmsiftError;
use tracing::error;

mod import;
mod serve;
mod status;
mod train;

/// smsift - a continuously running SMS spam classification agent.
#[derive(Parser, Debug)]
#[command(name = "smsift", version, about, long_about = None)]
struct Cli {
    /// Path to a specific config file (otherwise the XDG hierarchy applies).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the agent: scoring workers, retrain loop, optional simulator.
    Serve,
    /// Import the labeled SMS dataset and build the train/holdout split.
    Import {
        /// Delete and re-create all dataset rows even if already imported.
        #[arg(long)]
        force: bool,
    },
    /// Train a model version immediately, bypassing the gold counter.
    Train {
        /// Training-set sizing: light, medium, or full.
        #[arg(long, default_value = "light")]
        template: String,
        /// Persist the version without flipping the active pointer.
        #[arg(long)]
        no_activate: bool,
    },
    /// Show queue counts, the active model, and retrain counter state.
    Status,
}

fn load_config(path: Option<&PathBuf>) -> Result<SmsiftConfig, SmsiftError> {
    let config = match path {
        Some(path) => smsift_config::load_config_from_path(path),
        None => smsift_config::load_config(),
    }
    .map_err(|e| SmsiftError::Config(e.to_string()))?;
    config.validate().map_err(SmsiftError::Config)?;
    Ok(config)
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = result {
        error!(error = %e, "smsift exited with an error");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), SmsiftError> {
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.agent.log_level);

    match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Import { force } => import::run_import(&config, force).await,
        Commands::Train {
            template,
            no_activate,
        } => train::run_train(&config, &template, !no_activate).await,
        Commands::Status => status::run_status(&config).await,
    }
}
