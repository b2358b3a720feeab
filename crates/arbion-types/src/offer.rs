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

use crate::curve::{BlockValue, OfferCurve};
use crate::period::Period;

/// Typed curves of one offer before they are flattened into blocks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferCurves {
    pub charge: BTreeMap<Period, OfferCurve>,
    pub discharge: BTreeMap<Period, OfferCurve>,
    /// End-of-horizon state-of-charge valuation
    pub soc: BTreeMap<Period, OfferCurve>,
}

/// Scalar constants attached to every offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferConstants {
    pub soc_begin: f64,
    pub init_en: f64,
    pub init_status: i32,
    pub ramp_dn: f64,
    pub ramp_up: f64,
    pub socmax: f64,
    pub socmin: f64,
    pub eff_ch: f64,
    pub eff_dc: f64,
    pub soc_end: f64,
    pub bid_soc: bool,
}

/// Offer of a single resource in the market's submission schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOffer {
    pub block_ch_mc: BTreeMap<Period, BlockValue>,
    pub block_ch_mq: BTreeMap<Period, BlockValue>,
    pub block_dc_mc: BTreeMap<Period, BlockValue>,
    pub block_dc_mq: BTreeMap<Period, BlockValue>,
    pub block_soc_mc: BTreeMap<Period, BlockValue>,
    pub block_soc_mq: BTreeMap<Period, BlockValue>,
    pub cost_rgu: BTreeMap<Period, f64>,
    pub cost_rgd: BTreeMap<Period, f64>,
    pub cost_spr: BTreeMap<Period, f64>,
    pub cost_nsp: BTreeMap<Period, f64>,
    pub chmax: BTreeMap<Period, f64>,
    pub dcmax: BTreeMap<Period, f64>,
    #[serde(flatten)]
    pub constants: OfferConstants,
}

/// Offers keyed by resource id, the document written for the market
pub type OfferDocument = BTreeMap<String, ResourceOffer>;

/// Split typed curves into (quantity, price) block maps
pub fn split_blocks(
    curves: BTreeMap<Period, OfferCurve>,
) -> (BTreeMap<Period, BlockValue>, BTreeMap<Period, BlockValue>) {
    let mut quantities = BTreeMap::new();
    let mut prices = BTreeMap::new();
    for (period, curve) in curves {
        let (mq, mc) = curve.into_blocks();
        quantities.insert(period, mq);
        prices.insert(period, mc);
    }
    (quantities, prices)
}
