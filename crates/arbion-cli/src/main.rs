// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Arbion.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result};
use arbion_cli::cli::{Cli, Commands, run_inspect, run_offer};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing, RUST_LOG wins over --log-level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    match cli.command {
        Commands::Offer(args) => {
            let path = run_offer(&args)?;
            info!("Offer written to {}", path.display());
        }
        Commands::Inspect(args) => {
            let table = run_inspect(&args)?;
            println!("{table}");
        }
    }

    Ok(())
}
