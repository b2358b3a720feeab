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

//! Error types for the offer engine

use arbion_types::Period;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfferError {
    #[error("price forecast is empty")]
    EmptyForecast,

    #[error("price forecast has {actual} values, horizon needs {expected}")]
    ForecastLength { expected: usize, actual: usize },

    #[error("dispatch solver failed: {0}")]
    Solver(String),

    #[error("schedule has no complete arbitrage cycle: {0}")]
    NoArbitrageCycle(String),

    #[error("malformed curve in period {period}: {detail}")]
    MalformedCurve { period: String, detail: String },

    #[error("unsupported market type: {0}")]
    UnknownMarketType(String),

    #[error("no day-ahead prices for market {market_type} at bus {bus}")]
    MissingPrices { market_type: String, bus: String },

    #[error("resource document is missing {0}")]
    MissingResource(String),

    /// Output contradicts its inputs; a defect, not a user error
    #[error("internal consistency violation: {0}")]
    Invariant(String),
}

impl OfferError {
    pub fn malformed(period: Option<Period>, detail: impl Into<String>) -> Self {
        Self::MalformedCurve {
            period: period.map_or_else(|| "<unknown>".to_owned(), |p| p.to_string()),
            detail: detail.into(),
        }
    }

    /// True for internal-consistency failures as opposed to bad input or
    /// solver trouble
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

pub type Result<T> = std::result::Result<T, OfferError>;
