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

//! Shared data model for the Arbion offer engine.

pub mod config;
pub mod curve;
pub mod ledger;
pub mod market;
pub mod offer;
pub mod period;
pub mod scheduling;

pub use config::{
    AgentConfig, BatteryConfig, BinningConfig, MarketSettings, OfferConstantsConfig,
    PricingConfig,
};
pub use curve::{BlockValue, CurvePoint, CurveSide, OfferCurve};
pub use ledger::{Ledger, LedgerEntry, entries_after};
pub use market::{
    MarketInfo, MarketKind, MarketPrices, PreviousMarket, ProductLedger, ProductSchedule,
    ResourceInfo, ResourceStatus,
};
pub use offer::{OfferConstants, OfferCurves, OfferDocument, ResourceOffer, split_blocks};
pub use period::Period;
pub use scheduling::Schedule;
