// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Arbion.

//! CLI module for the offer agent command-line interface.

pub mod args;
pub mod commands;
pub mod formatters;
pub mod loaders;

pub use args::{Cli, Commands, InspectArgs, OfferArgs};
pub use commands::{run_inspect, run_offer};
pub use formatters::{InspectionRow, TableFormatter};
pub use loaders::{load_config, load_market, load_resource, write_offer};
