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

pub mod agent;
pub mod assembler;
pub mod binning;
pub mod error;
pub mod opportunity;
pub mod realtime;
pub mod scheduling;

pub use agent::OfferAgent;
pub use assembler::{InitialState, OfferAssembler, curve_from_blocks};
pub use binning::CurveBinner;
pub use error::{OfferError, Result};
pub use opportunity::{OpportunityCostEngine, OpportunityCosts};
pub use realtime::{
    CapacityState, CapacityWarning, CapacityWarningKind, RealTimeCurveBuilder, RealTimeCurves,
};
pub use scheduling::{DispatchLimits, DispatchScheduler, DispatchSolver, LpDispatchSolver};
