// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Arbion.

//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "arbion")]
#[command(author, version, about = "Arbion battery storage offer agent")]
#[command(
    long_about = "Builds market offers for a battery storage resource.\n\
    \nDay-ahead markets are scheduled against the previous clearing prices,\n\
    real-time markets are offered from the ledger of accepted orders.\n\
    \nExamples:\n  \
    arbion offer 42 market.json resource.json          # Write offer_42.json\n  \
    arbion inspect --prices 10,10,50,50                # Show schedule and costs\n  \
    arbion --log-level debug offer 42 m.json r.json    # Verbose run"
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate an offer from market and resource documents
    #[command(
        long_about = "Generate the offer for one market invocation.\n\
        \nThe market type in the market document selects the cycle (DAM or RTM).\n\
        The offer is written as offer_<TIME_STEP>.json into the output directory.\n\
        \nExamples:\n  \
        arbion offer 42 market.json resource.json\n  \
        arbion offer 42 market.json resource.json --config battery.toml --output-dir out"
    )]
    Offer(OfferArgs),

    /// Print the dispatch schedule and opportunity costs for a forecast
    #[command(
        long_about = "Run the scheduler and the opportunity-cost engine on a price forecast\n\
        and print one row per period.\n\
        \nPrice sources (choose one):\n  \
        - Inline: --prices 10,10,50,50\n  \
        - Market document: --market-file market.json [--bus NEVP]\n\
        \nExamples:\n  \
        arbion inspect --prices 10,10,50,50\n  \
        arbion inspect --market-file market.json --config battery.toml"
    )]
    Inspect(InspectArgs),
}

#[derive(Debug, Parser)]
pub struct OfferArgs {
    /// Market time step, used in the output file name
    pub time_step: String,

    /// Market description (JSON)
    pub market_file: PathBuf,

    /// Resource description (JSON)
    pub resource_file: PathBuf,

    /// Agent configuration (TOML); defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the offer file is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Parser)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["prices", "market_file"])
))]
pub struct InspectArgs {
    /// Comma-separated price forecast
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub prices: Vec<f64>,

    /// Market description whose previous prices are inspected
    #[arg(long)]
    pub market_file: Option<PathBuf>,

    /// Price bus inside the market document
    #[arg(long, requires = "market_file")]
    pub bus: Option<String>,

    /// Agent configuration (TOML); defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offer_command() {
        let cli = Cli::try_parse_from([
            "arbion",
            "offer",
            "17",
            "market.json",
            "resource.json",
            "--output-dir",
            "out",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "info");
        let Commands::Offer(args) = cli.command else {
            panic!("expected offer command");
        };
        assert_eq!(args.time_step, "17");
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_parse_inline_prices() {
        let cli = Cli::try_parse_from([
            "arbion",
            "--log-level",
            "debug",
            "inspect",
            "--prices",
            "10,-5.5,50",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "debug");
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect command");
        };
        assert_eq!(args.prices, vec![10.0, -5.5, 50.0]);
    }

    #[test]
    fn test_inspect_needs_a_price_source() {
        assert!(Cli::try_parse_from(["arbion", "inspect"]).is_err());
        assert!(
            Cli::try_parse_from([
                "arbion",
                "inspect",
                "--prices",
                "1,2",
                "--market-file",
                "m.json"
            ])
            .is_err()
        );
    }
}
