// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Arbion.

//! Command implementations behind the CLI subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use arbion_core::{OfferAgent, OfferError};
use tracing::{info, warn};

use crate::cli::args::{InspectArgs, OfferArgs};
use crate::cli::formatters::{InspectionRow, TableFormatter};
use crate::cli::loaders::{load_config, load_market, load_resource, write_offer};

/// Generate the offer and write it; returns the written path
pub fn run_offer(args: &OfferArgs) -> Result<PathBuf> {
    let config = load_config(args.config.as_deref())?;
    let market = load_market(&args.market_file)?;
    let resource = load_resource(&args.resource_file)?;
    info!(
        "Offer for {} in {} at step {}",
        resource.rid, market.market_type, args.time_step
    );

    let agent = OfferAgent::new(config);
    let offer = agent
        .make_offer(&market, &resource)
        .with_context(|| format!("Failed to build offer for {}", resource.rid))?;

    write_offer(&args.output_dir, &args.time_step, &offer)
}

/// Schedule a forecast and render the per-period table
pub fn run_inspect(args: &InspectArgs) -> Result<String> {
    let config = load_config(args.config.as_deref())?;

    let (labels, prices) = match &args.market_file {
        Some(path) => {
            let market = load_market(path)?;
            let Some(bus) = args.bus.as_deref().or(config.market.price_bus.as_deref()) else {
                bail!("--bus is required when the configuration names no price bus");
            };
            let Some(prices) = market.previous_prices(bus) else {
                bail!("{} has no previous prices at bus {bus}", path.display());
            };
            let labels: Vec<String> = if market.timestamps.is_empty() {
                (0..prices.len()).map(|t| t.to_string()).collect()
            } else {
                market.timestamps.iter().map(ToString::to_string).collect()
            };
            let len = labels.len().min(prices.len());
            (labels[..len].to_vec(), prices[..len].to_vec())
        }
        None => (
            (0..args.prices.len()).map(|t| t.to_string()).collect(),
            args.prices.clone(),
        ),
    };

    let agent = OfferAgent::new(config);
    let schedule = agent.scheduler().schedule(&prices)?;
    let costs = match agent.cost_engine().compute(&prices, &schedule) {
        Ok(costs) => Some(costs),
        Err(OfferError::NoArbitrageCycle(reason)) => {
            warn!("No opportunity costs: {reason}");
            None
        }
        Err(err) => return Err(err.into()),
    };

    let rows = InspectionRow::collect(
        &labels,
        &prices,
        &schedule,
        costs.as_ref(),
        agent.config().battery.efficiency,
    );
    Ok(TableFormatter::format_inspection(
        &rows,
        schedule.profit(&prices),
    ))
}
