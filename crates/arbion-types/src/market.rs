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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::Ledger;
use crate::period::Period;

// ============= Market Documents =============

/// Which clearing cycle an invocation bids into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketKind {
    DayAhead,
    RealTime,
}

impl MarketKind {
    /// Market operators decorate the type (`TSDAM`, `MSDAM`, `RTM`, ...),
    /// only the cycle marker matters here.
    pub fn from_market_type(market_type: &str) -> Option<Self> {
        if market_type.contains("DAM") {
            Some(Self::DayAhead)
        } else if market_type.contains("RTM") {
            Some(Self::RealTime)
        } else {
            None
        }
    }
}

/// Market description handed to the agent for one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInfo {
    pub market_type: String,
    /// Periods of the bidding horizon
    pub timestamps: Vec<Period>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub current_time: Option<Period>,
    /// Results of earlier clearings keyed by market type
    #[serde(default)]
    pub previous: BTreeMap<String, PreviousMarket>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviousMarket {
    #[serde(default)]
    pub prices: MarketPrices,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPrices {
    /// Energy prices per bus
    #[serde(rename = "EN", default)]
    pub energy: BTreeMap<String, Vec<f64>>,
}

impl MarketInfo {
    pub fn kind(&self) -> Option<MarketKind> {
        MarketKind::from_market_type(&self.market_type)
    }

    /// Earliest period of the horizon; timestamps are not guaranteed sorted
    pub fn horizon_start(&self) -> Option<Period> {
        self.timestamps.iter().min().copied()
    }

    /// Wall-clock time of the invocation
    ///
    /// Uses `current_time` when present, otherwise the timestamp suffix of
    /// the market uid (e.g. `TSDAM202408011200`).
    pub fn now(&self) -> Option<Period> {
        if let Some(now) = self.current_time {
            return Some(now);
        }
        let uid = self.uid.as_deref()?;
        let start = uid.len().checked_sub(12)?;
        Period::parse(uid.get(start..)?).ok()
    }

    /// Energy prices of the previous clearing of this market type at `bus`
    pub fn previous_prices(&self, bus: &str) -> Option<&[f64]> {
        self.previous
            .get(&self.market_type)
            .and_then(|previous| previous.prices.energy.get(bus))
            .map(Vec::as_slice)
    }
}

// ============= Resource Documents =============

/// Resource description handed to the agent for one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub rid: String,
    #[serde(default)]
    pub bus: Option<String>,
    #[serde(default)]
    pub status: BTreeMap<String, ResourceStatus>,
    #[serde(default)]
    pub schedule: BTreeMap<String, ProductSchedule>,
    #[serde(default)]
    pub ledger: BTreeMap<String, ProductLedger>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// Current state of charge (MWh)
    pub soc: f64,
    /// Current dispatch level (MW)
    #[serde(default)]
    pub dispatch: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSchedule {
    #[serde(rename = "EN", default)]
    pub energy: BTreeMap<Period, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductLedger {
    #[serde(rename = "EN", default)]
    pub energy: Ledger,
}

impl ResourceInfo {
    pub fn own_status(&self) -> Option<&ResourceStatus> {
        self.status.get(&self.rid)
    }

    pub fn energy_ledger(&self) -> Option<&Ledger> {
        self.ledger.get(&self.rid).map(|l| &l.energy)
    }

    pub fn energy_schedule(&self) -> Option<&BTreeMap<Period, f64>> {
        self.schedule.get(&self.rid).map(|s| &s.energy)
    }
}
