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

//! Marginal charge and discharge costs derived from a dispatch schedule.
//!
//! Every period is priced by looking around it in the forecast: a charging
//! period is valued against the next discharge, a discharging period against
//! the previous charge, and idle periods by their position relative to the
//! scheduled cycles.

use std::ops::Range;

use arbion_types::{BatteryConfig, PricingConfig, Schedule};
use serde::Serialize;
use tracing::debug;

use crate::error::{OfferError, Result};

/// Net flows smaller than this are idle; absorbs LP round-off
const FLOW_EPSILON: f64 = 1e-6;

/// Gap between charge and discharge cost when charging in the first period
const FIRST_PERIOD_SPREAD: f64 = 0.01;

/// Per-period marginal costs, aligned with the forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpportunityCosts {
    pub charge: Vec<f64>,
    pub discharge: Vec<f64>,
}

impl OpportunityCosts {
    pub fn len(&self) -> usize {
        self.charge.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charge.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Charging,
    Discharging,
    Idle,
}

impl Flow {
    fn classify(net: f64) -> Self {
        if net < -FLOW_EPSILON {
            Self::Charging
        } else if net > FLOW_EPSILON {
            Self::Discharging
        } else {
            Self::Idle
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpportunityCostEngine {
    efficiency: f64,
    price_floor: f64,
}

impl OpportunityCostEngine {
    pub fn new(battery: &BatteryConfig, pricing: &PricingConfig) -> Self {
        Self {
            efficiency: battery.efficiency,
            price_floor: pricing.price_floor,
        }
    }

    /// Assign charge and discharge costs to every period of `prices`
    ///
    /// The schedule must contain at least one charging and one discharging
    /// period, otherwise there is no cycle to value.
    pub fn compute(&self, prices: &[f64], schedule: &Schedule) -> Result<OpportunityCosts> {
        if prices.is_empty() {
            return Err(OfferError::EmptyForecast);
        }
        if schedule.len() != prices.len() || schedule.discharge.len() != prices.len() {
            return Err(OfferError::Invariant(format!(
                "schedule covers {} periods, forecast has {}",
                schedule.len(),
                prices.len()
            )));
        }

        let flows: Vec<Flow> = schedule
            .net_flow()
            .into_iter()
            .map(Flow::classify)
            .collect();
        let first_charge = flows
            .iter()
            .position(|f| *f == Flow::Charging)
            .ok_or_else(|| OfferError::NoArbitrageCycle("no charging period".to_owned()))?;
        let last_discharge = flows
            .iter()
            .rposition(|f| *f == Flow::Discharging)
            .ok_or_else(|| OfferError::NoArbitrageCycle("no discharging period".to_owned()))?;

        let mut costs = OpportunityCosts {
            charge: Vec::with_capacity(prices.len()),
            discharge: Vec::with_capacity(prices.len()),
        };
        for (i, flow) in flows.iter().enumerate() {
            let (charge, discharge) = match flow {
                Flow::Charging => self.while_charging(prices, &flows, i),
                Flow::Discharging => self.while_discharging(prices, &flows, i),
                Flow::Idle if i < first_charge => self.before_first_charge(prices, first_charge, i),
                Flow::Idle if i > last_discharge => {
                    self.after_last_discharge(prices, last_discharge, i)
                }
                Flow::Idle => self.between_cycles(prices, &flows, i)?,
            };
            debug!(
                "price... time {i} lmp {} ch {charge:.4} dc {discharge:.4}",
                prices[i]
            );
            costs.charge.push(charge);
            costs.discharge.push(discharge);
        }

        if costs.charge.iter().map(|c| c.abs()).sum::<f64>() == 0.0 {
            return Err(OfferError::Invariant(
                "charge opportunity costs are all zero".to_owned(),
            ));
        }
        if costs.discharge.iter().map(|d| d.abs()).sum::<f64>() == 0.0 {
            return Err(OfferError::Invariant(
                "discharge opportunity costs are all zero".to_owned(),
            ));
        }

        Ok(costs)
    }

    fn while_charging(&self, prices: &[f64], flows: &[Flow], i: usize) -> (f64, f64) {
        let own = prices[i];
        // next discharge, or the following period at the end of the horizon
        let j = next_index(flows, i + 1, Flow::Discharging)
            .unwrap_or_else(|| (i + 1).min(prices.len() - 1));

        if i == 0 {
            let charge = min_in(prices, 1..j)
                .unwrap_or(own)
                .min(self.efficiency * prices[j]);
            return (charge, charge + FIRST_PERIOD_SPREAD);
        }

        let best_buy = min_in(prices, 0..i).unwrap_or(own);
        let best_sell = if j == i + 1 {
            0.0
        } else if j == i + 2 {
            prices[j - 1]
        } else {
            max_in(prices, i..j + 1).unwrap_or(own)
        };
        let cheapest_other = prices
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != i)
            .map(|(_, p)| *p)
            .reduce(f64::min)
            .unwrap_or(own);

        (
            self.efficiency * cheapest_other,
            self.efficiency * best_buy + best_sell - own,
        )
    }

    fn while_discharging(&self, prices: &[f64], flows: &[Flow], i: usize) -> (f64, f64) {
        let own = prices[i];
        // last charge strictly before the previous period, or the horizon start
        let j = last_index(flows, i.saturating_sub(1), Flow::Charging).unwrap_or(0);

        let best_sell = if i == prices.len() - 1 {
            0.0
        } else {
            max_in(prices, i + 1..prices.len()).unwrap_or(own)
        };
        let best_buy = if i.checked_sub(1) == Some(j) {
            prices[j].min(0.0)
        } else if i.checked_sub(2) == Some(j) {
            prices[j + 1]
        } else {
            min_in(prices, j + 1..i).unwrap_or(own)
        };

        (
            self.efficiency * (own - best_buy) - best_sell,
            min_in(prices, j..i).unwrap_or(own) / self.efficiency,
        )
    }

    fn before_first_charge(&self, prices: &[f64], first_charge: usize, i: usize) -> (f64, f64) {
        let own = prices[i];
        (
            self.efficiency * min_in(prices, i..first_charge + 1).unwrap_or(own),
            min_in(prices, 0..i).unwrap_or(own) / self.efficiency,
        )
    }

    fn after_last_discharge(&self, prices: &[f64], last_discharge: usize, i: usize) -> (f64, f64) {
        let own = prices[i];
        let charge = if i + 2 <= prices.len() {
            self.efficiency * max_in(prices, i + 1..prices.len()).unwrap_or(own)
        } else {
            self.price_floor
        };
        (
            charge,
            min_in(prices, last_discharge..i + 1).unwrap_or(own) / self.efficiency,
        )
    }

    fn between_cycles(&self, prices: &[f64], flows: &[Flow], i: usize) -> Result<(f64, f64)> {
        let own = prices[i];
        let (Some(next), Some(prev)) = (
            next_index(flows, i, Flow::Discharging),
            last_index(flows, i, Flow::Charging),
        ) else {
            return Err(OfferError::Invariant(format!(
                "idle period {i} is not enclosed by a charge and a discharge"
            )));
        };

        let charge = if i <= prev + 1 {
            prices[prev]
        } else {
            (self.efficiency * max_in(prices, prev + 1..i).unwrap_or(own)).max(prices[prev])
        };
        let discharge = if i + 1 >= next {
            prices[next].min(prices[i + 1] / self.efficiency)
        } else {
            prices[next].min(min_in(prices, i + 1..next + 1).unwrap_or(own) / self.efficiency)
        };

        Ok((charge, discharge))
    }
}

/// First index at or after `from` with the given flow
fn next_index(flows: &[Flow], from: usize, wanted: Flow) -> Option<usize> {
    flows
        .iter()
        .skip(from)
        .position(|f| *f == wanted)
        .map(|offset| from + offset)
}

/// Last index strictly before `before` with the given flow
fn last_index(flows: &[Flow], before: usize, wanted: Flow) -> Option<usize> {
    flows
        .get(..before)?
        .iter()
        .rposition(|f| *f == wanted)
}

/// Minimum over a window; `None` for an empty or out-of-range window
fn min_in(prices: &[f64], window: Range<usize>) -> Option<f64> {
    prices.get(window)?.iter().copied().reduce(f64::min)
}

fn max_in(prices: &[f64], window: Range<usize>) -> Option<f64> {
    prices.get(window)?.iter().copied().reduce(f64::max)
}
