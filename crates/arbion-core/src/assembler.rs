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

use std::collections::BTreeMap;

use arbion_types::{
    AgentConfig, BatteryConfig, BlockValue, CurveSide, OfferConstants, OfferConstantsConfig,
    OfferCurve, OfferCurves, Period, PricingConfig, ResourceInfo, ResourceOffer, ResourceStatus,
    Schedule, split_blocks,
};
use tracing::{debug, info};

use crate::binning::CurveBinner;
use crate::error::{OfferError, Result};
use crate::opportunity::OpportunityCosts;
use crate::realtime::RealTimeCurves;

/// Battery state an offer starts from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialState {
    pub soc_begin: f64,
    pub init_en: f64,
}

impl From<&ResourceStatus> for InitialState {
    fn from(status: &ResourceStatus) -> Self {
        Self {
            soc_begin: status.soc,
            init_en: status.dispatch,
        }
    }
}

/// Turns typed curves into the per-resource offer written for the market
#[derive(Debug, Clone)]
pub struct OfferAssembler {
    battery: BatteryConfig,
    pricing: PricingConfig,
    constants: OfferConstantsConfig,
    binner: CurveBinner,
}

impl OfferAssembler {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            battery: config.battery.clone(),
            pricing: config.pricing.clone(),
            constants: config.constants.clone(),
            binner: CurveBinner::new(&config.binning),
        }
    }

    /// Day-ahead offer: one scalar step per period at the scheduled quantity
    pub fn day_ahead(
        &self,
        horizon: &[Period],
        schedule: &Schedule,
        costs: &OpportunityCosts,
        initial: InitialState,
    ) -> Result<ResourceOffer> {
        if schedule.len() != horizon.len() || costs.len() != horizon.len() {
            return Err(OfferError::Invariant(format!(
                "horizon has {} periods, schedule {} and costs {}",
                horizon.len(),
                schedule.len(),
                costs.len()
            )));
        }

        let mut curves = OfferCurves::default();
        for (t, &period) in horizon.iter().enumerate() {
            let charge_price = self.day_ahead_price(costs.charge[t]);
            let discharge_price = self.day_ahead_price(costs.discharge[t]);
            let charge = OfferCurve::scalar(schedule.charge[t], charge_price);
            let discharge = OfferCurve::scalar(schedule.discharge[t], discharge_price);
            curves
                .charge
                .insert(period, self.binner.collate(charge, CurveSide::Charge)?);
            curves
                .discharge
                .insert(period, self.binner.collate(discharge, CurveSide::Discharge)?);
            curves.soc.insert(period, OfferCurve::scalar(0.0, 0.0));
        }

        let constants = self.offer_constants(initial, false);
        self.finish(horizon, curves, constants)
    }

    /// Real-time offer from the ledger walk; SoC valuation only at the end
    pub fn real_time(
        &self,
        horizon: &[Period],
        real_time: RealTimeCurves,
        status: &ResourceStatus,
    ) -> Result<ResourceOffer> {
        let constants = self.offer_constants(InitialState::from(status), true);
        self.finish(horizon, real_time.curves, constants)
    }

    /// Estimate where the battery will stand when the day-ahead horizon opens
    ///
    /// Energy already scheduled between `now` and the first horizon period
    /// is taken out of the current SoC; charging counts after losses.
    pub fn estimate_initial_state(
        &self,
        resource: &ResourceInfo,
        status: &ResourceStatus,
        now: Option<Period>,
        first: Period,
    ) -> InitialState {
        let Some(schedule) = resource.energy_schedule() else {
            return InitialState {
                soc_begin: self.battery.clamp_soc(status.soc),
                init_en: 0.0,
            };
        };

        let scheduled: f64 = schedule
            .iter()
            .filter(|(period, _)| now.is_none_or(|now| **period >= now) && **period < first)
            .map(|(_, &q)| if q < 0.0 { q * self.battery.efficiency } else { q })
            .sum();
        let estimate = status.soc - scheduled * self.battery.interval_hours();
        debug!("Scheduled energy before {first}: {scheduled}, SoC estimate {estimate}");

        InitialState {
            soc_begin: self.battery.clamp_soc(estimate),
            init_en: schedule.get(&first).copied().unwrap_or(0.0),
        }
    }

    /// Raise discharge prices by the markup and lower charge prices by the
    /// markdown, in place on an assembled offer; neither pushes a price past
    /// the configured floor or ceiling
    pub fn adjust_prices(&self, offer: &mut ResourceOffer) -> Result<()> {
        let markup = self.pricing.discharge_markup;
        if markup != 0.0 {
            self.shift_block(&offer.block_dc_mq, &mut offer.block_dc_mc, markup)?;
            info!("Increasing discharging offers by ${markup}");
        }
        let markdown = self.pricing.charge_markdown;
        if markdown != 0.0 {
            self.shift_block(&offer.block_ch_mq, &mut offer.block_ch_mc, -markdown)?;
            info!("Decreasing charging offers by ${markdown}");
        }
        Ok(())
    }

    fn shift_block(
        &self,
        quantities: &BTreeMap<Period, BlockValue>,
        prices: &mut BTreeMap<Period, BlockValue>,
        delta: f64,
    ) -> Result<()> {
        for (period, mc) in prices.iter_mut() {
            let mq = quantities.get(period).ok_or_else(|| {
                OfferError::malformed(Some(*period), "price block without quantities")
            })?;
            let mut curve = curve_from_blocks(*period, mq, mc)?;
            curve.shift_prices(delta, self.pricing.price_floor, self.pricing.price_ceiling);
            *mc = curve.into_blocks().1;
        }
        Ok(())
    }

    fn day_ahead_price(&self, cost: f64) -> f64 {
        if self.pricing.clamp_day_ahead_prices {
            self.pricing.clamp(cost)
        } else {
            cost
        }
    }

    fn offer_constants(&self, initial: InitialState, bid_soc: bool) -> OfferConstants {
        OfferConstants {
            soc_begin: initial.soc_begin,
            init_en: initial.init_en,
            init_status: self.constants.init_status,
            ramp_dn: self.constants.ramp_dn,
            ramp_up: self.constants.ramp_up,
            socmax: self.battery.socmax,
            socmin: self.battery.socmin,
            eff_ch: self.battery.efficiency,
            eff_dc: 1.0,
            soc_end: self.battery.socmin,
            bid_soc,
        }
    }

    fn finish(
        &self,
        horizon: &[Period],
        curves: OfferCurves,
        constants: OfferConstants,
    ) -> Result<ResourceOffer> {
        let (block_ch_mq, block_ch_mc) = split_blocks(curves.charge);
        let (block_dc_mq, block_dc_mc) = split_blocks(curves.discharge);
        let (block_soc_mq, block_soc_mc) = split_blocks(curves.soc);

        let zeros: BTreeMap<Period, f64> = horizon.iter().map(|&p| (p, 0.0)).collect();
        let mut offer = ResourceOffer {
            block_ch_mc,
            block_ch_mq,
            block_dc_mc,
            block_dc_mq,
            block_soc_mc,
            block_soc_mq,
            cost_rgu: zeros.clone(),
            cost_rgd: zeros.clone(),
            cost_spr: zeros.clone(),
            cost_nsp: zeros,
            chmax: horizon.iter().map(|&p| (p, self.battery.chmax)).collect(),
            dcmax: horizon.iter().map(|&p| (p, self.battery.dcmax)).collect(),
            constants,
        };
        self.adjust_prices(&mut offer)?;
        Ok(offer)
    }
}

/// Rebuild a typed curve from the quantity and price blocks of one period
pub fn curve_from_blocks(period: Period, mq: &BlockValue, mc: &BlockValue) -> Result<OfferCurve> {
    match (mq, mc) {
        (BlockValue::Flat(quantity), BlockValue::Flat(price)) => {
            Ok(OfferCurve::scalar(*quantity, *price))
        }
        (BlockValue::Steps(quantities), BlockValue::Steps(prices))
            if quantities.len() == prices.len() =>
        {
            Ok(OfferCurve::Steps {
                quantities: quantities.clone(),
                prices: prices.clone(),
            })
        }
        _ => Err(OfferError::malformed(
            Some(period),
            format!("quantity is {}, price is {}", mq.shape(), mc.shape()),
        )),
    }
}
