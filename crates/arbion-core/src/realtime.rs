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

//! Real-time offer curves built from the ledger of accepted orders.
//!
//! No optimization runs here. The builder walks the ledger in time order,
//! tracking how much energy the battery can still release or absorb, and
//! offers the remaining physical capacity plus a valuation of whatever is
//! left in storage at the end of the horizon.

use std::fmt;

use arbion_types::{
    BatteryConfig, CurvePoint, CurveSide, Ledger, LedgerEntry, OfferCurve, OfferCurves, Period,
    PricingConfig, entries_after,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::binning::CurveBinner;
use crate::error::{OfferError, Result};

/// Capacity or energy below this is not worth offering
const RESIDUAL_THRESHOLD: f64 = 1e-2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityWarningKind {
    /// Accepted charging exceeds the remaining headroom
    ChargeOverflow,
    /// Accepted discharging exceeds the available energy
    DischargeOverflow,
}

/// A ledger entry that pushed the battery past one of its SoC bounds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityWarning {
    pub period: Period,
    pub kind: CapacityWarningKind,
    /// Offending power quantity as listed in the ledger
    pub quantity: f64,
}

impl fmt::Display for CapacityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CapacityWarningKind::ChargeOverflow => write!(
                f,
                "period {}: scheduled charge {} exceeds SoC headroom",
                self.period, self.quantity
            ),
            CapacityWarningKind::DischargeOverflow => write!(
                f,
                "period {}: scheduled discharge {} exceeds available SoC",
                self.period, self.quantity
            ),
        }
    }
}

/// Energy the battery can still move in each direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityState {
    /// Energy dischargeable before reaching `socmin`
    pub soc_available: f64,
    /// Energy chargeable before reaching `socmax`
    pub soc_headroom: f64,
}

/// How a single ledger entry changed the capacity state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Charged,
    Discharged,
    Overflow(CapacityWarningKind),
    Ignored,
}

impl CapacityState {
    /// State for the current SoC, clamped into the battery's bounds
    pub fn new(soc_now: f64, battery: &BatteryConfig) -> Self {
        let soc = battery.clamp_soc(soc_now);
        if soc != soc_now {
            warn!(
                "Current SoC {soc_now} outside [{}, {}], using {soc}",
                battery.socmin, battery.socmax
            );
        }
        Self {
            soc_available: soc - battery.socmin,
            soc_headroom: battery.socmax - soc,
        }
    }

    /// Apply one accepted order moving `energy` (negative charges)
    fn apply(&mut self, energy: f64, efficiency: f64, capacity: f64) -> Applied {
        if energy < 0.0 && energy >= -self.soc_headroom {
            let stored = -energy * efficiency;
            self.soc_headroom -= stored;
            self.soc_available += stored;
            Applied::Charged
        } else if energy > 0.0 && energy <= self.soc_available {
            self.soc_available -= energy;
            self.soc_headroom += energy;
            Applied::Discharged
        } else if energy < -self.soc_headroom {
            self.soc_headroom = 0.0;
            self.soc_available = capacity;
            Applied::Overflow(CapacityWarningKind::ChargeOverflow)
        } else if energy > self.soc_available {
            self.soc_available = 0.0;
            self.soc_headroom = capacity;
            Applied::Overflow(CapacityWarningKind::DischargeOverflow)
        } else {
            Applied::Ignored
        }
    }
}

/// Output of one real-time cycle
#[derive(Debug, Clone, PartialEq)]
pub struct RealTimeCurves {
    pub curves: OfferCurves,
    /// Capacity left after every accepted order in the horizon
    pub capacity: CapacityState,
    pub warnings: Vec<CapacityWarning>,
    pub best_charge_price: f64,
    pub best_discharge_price: f64,
}

#[derive(Debug, Clone)]
pub struct RealTimeCurveBuilder {
    battery: BatteryConfig,
    pricing: PricingConfig,
    binner: CurveBinner,
}

impl RealTimeCurveBuilder {
    pub fn new(battery: &BatteryConfig, pricing: &PricingConfig, binner: CurveBinner) -> Self {
        Self {
            battery: battery.clone(),
            pricing: pricing.clone(),
            binner,
        }
    }

    /// Build charge and discharge curves for every period of `horizon` and
    /// the SoC valuation curve for its latest period
    pub fn build(
        &self,
        horizon: &[Period],
        soc_now: f64,
        ledger: &Ledger,
    ) -> Result<RealTimeCurves> {
        // periods may arrive in any order
        let Some(&last) = horizon.iter().max() else {
            return Err(OfferError::EmptyForecast);
        };
        debug!("Last timestamp set to {last}");

        let hours = self.battery.interval_hours();
        let capacity = self.battery.capacity();
        let mut state = CapacityState::new(soc_now, &self.battery);
        let mut best_charge_price = self.pricing.price_ceiling;
        let mut best_discharge_price = self.pricing.price_floor;
        let mut warnings = Vec::new();
        let mut curves = OfferCurves::default();

        for &period in horizon {
            // zero-cost slack at full power
            let mut charge = vec![CurvePoint::new(self.battery.chmax, 0.0)];
            let mut discharge = vec![CurvePoint::new(self.battery.dcmax, 0.0)];

            match ledger.get(&period).filter(|entries| !entries.is_empty()) {
                None => debug!("No ledger entry in period {period}"),
                Some(entries) => {
                    debug!(
                        "Walking energy ledger in period {period}, {} orders",
                        entries.len()
                    );
                    for entry in entries {
                        let applied =
                            state.apply(entry.energy(hours), self.battery.efficiency, capacity);
                        match applied {
                            Applied::Charged
                            | Applied::Overflow(CapacityWarningKind::ChargeOverflow) => {
                                best_charge_price = best_charge_price.min(entry.price);
                            }
                            Applied::Discharged
                            | Applied::Overflow(CapacityWarningKind::DischargeOverflow) => {
                                best_discharge_price = best_discharge_price.max(entry.price);
                            }
                            Applied::Ignored => {}
                        }
                        if let Applied::Overflow(kind) = applied {
                            let warning = CapacityWarning {
                                period,
                                kind,
                                quantity: entry.quantity,
                            };
                            warn!("{warning}, clamping");
                            warnings.push(warning);
                        }
                    }

                    // zero while the full-power slack step is in the curve
                    let dc_residual =
                        self.battery.dcmax - discharge.iter().map(|p| p.quantity).sum::<f64>();
                    if dc_residual > RESIDUAL_THRESHOLD {
                        discharge.push(CurvePoint::new(dc_residual, best_discharge_price));
                        debug!("Added {dc_residual} discharging capacity in {period}");
                    }
                    let ch_residual =
                        self.battery.chmax - charge.iter().map(|p| p.quantity).sum::<f64>();
                    if ch_residual > RESIDUAL_THRESHOLD {
                        charge.push(CurvePoint::new(ch_residual, best_charge_price));
                        debug!("Added {ch_residual} charging capacity in {period}");
                    }
                }
            }

            curves
                .charge
                .insert(period, self.bin(period, &charge, CurveSide::Charge)?);
            curves
                .discharge
                .insert(period, self.bin(period, &discharge, CurveSide::Discharge)?);
        }

        let after = entries_after(ledger, last);
        debug!("Ledger holds {} orders past the horizon", after.len());
        for entry in &after {
            best_charge_price = best_charge_price.min(entry.price);
            best_discharge_price = best_discharge_price.max(entry.price);
        }
        debug!(
            "Best charging price {best_charge_price}, best discharging price {best_discharge_price}"
        );

        let soc_points = self.value_end_of_horizon(&state, after);
        info!("SoC offer has {} elements", soc_points.len());
        let soc_curve = self.bin(last, &soc_points, CurveSide::Charge)?;
        info!("Binned SoC offer has {} elements", soc_curve.len());
        curves.soc.insert(last, soc_curve);

        Ok(RealTimeCurves {
            curves,
            capacity: state,
            warnings,
            best_charge_price,
            best_discharge_price,
        })
    }

    /// Value the energy left at the end of the horizon against orders
    /// already accepted for later periods, best price first
    fn value_end_of_horizon(
        &self,
        state: &CapacityState,
        mut after: Vec<LedgerEntry>,
    ) -> Vec<CurvePoint> {
        after.sort_by(|a, b| b.price.total_cmp(&a.price));

        let hours = self.battery.interval_hours();
        let mut remaining = state.soc_available;
        info!("{remaining} MWh available at end of horizon, allocating value");

        let mut points = Vec::new();
        for entry in &after {
            let energy = entry.energy(hours);
            if energy > 0.0 && energy <= remaining {
                debug!("Post-horizon SoC quantity {} valued at {}", entry.quantity, entry.price);
                remaining -= energy;
                points.push(CurvePoint::new(entry.quantity, entry.price));
            } else if remaining > 0.0 && remaining < energy {
                // the exhausted remainder is recorded as zero
                remaining = 0.0;
                points.push(CurvePoint::new(remaining, entry.price));
            } else if remaining < RESIDUAL_THRESHOLD {
                break;
            }
        }

        if remaining > RESIDUAL_THRESHOLD {
            points.push(CurvePoint::new(remaining, self.pricing.price_ceiling));
        }
        points.push(CurvePoint::new(state.soc_headroom, 0.0));
        points
    }

    fn bin(&self, period: Period, points: &[CurvePoint], side: CurveSide) -> Result<OfferCurve> {
        let quantities: Vec<f64> = points.iter().map(|p| p.quantity).collect();
        let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
        self.binner
            .collate_lists(Some(period), &quantities, &prices, side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbion_types::BinningConfig;

    const TOLERANCE: f64 = 1e-9;

    fn period(minute: u32) -> Period {
        Period::parse(&format!("2024080112{minute:02}")).unwrap()
    }

    fn horizon(len: u32) -> Vec<Period> {
        (0..len).map(|i| period(i * 5)).collect()
    }

    fn builder(battery: &BatteryConfig) -> RealTimeCurveBuilder {
        RealTimeCurveBuilder::new(
            battery,
            &PricingConfig::default(),
            CurveBinner::new(&BinningConfig::default()),
        )
    }

    /// available 100, headroom 50
    fn small_battery() -> BatteryConfig {
        BatteryConfig {
            socmax: 278.0,
            socmin: 128.0,
            ..BatteryConfig::default()
        }
    }

    fn steps(quantities: &[f64], prices: &[f64]) -> OfferCurve {
        OfferCurve::Steps {
            quantities: quantities.to_vec(),
            prices: prices.to_vec(),
        }
    }

    #[test]
    fn test_capacity_state_from_soc() {
        let state = CapacityState::new(228.0, &small_battery());
        assert_eq!(state.soc_available, 100.0);
        assert_eq!(state.soc_headroom, 50.0);

        let clamped = CapacityState::new(700.0, &BatteryConfig::default());
        assert_eq!(clamped.soc_available, 480.0);
        assert_eq!(clamped.soc_headroom, 0.0);
    }

    #[test]
    fn test_discharge_within_available() {
        let mut ledger = Ledger::new();
        ledger.insert(period(0), vec![LedgerEntry::new(600.0, 30.0)]);

        let out = builder(&small_battery())
            .build(&horizon(1), 228.0, &ledger)
            .unwrap();

        assert!((out.capacity.soc_available - 50.0).abs() < TOLERANCE);
        assert!((out.capacity.soc_headroom - 100.0).abs() < TOLERANCE);
        assert!(out.warnings.is_empty());
        assert_eq!(out.best_discharge_price, 30.0);
    }

    #[test]
    fn test_charge_stores_efficiency_scaled_energy() {
        let mut ledger = Ledger::new();
        ledger.insert(period(0), vec![LedgerEntry::new(-240.0, 5.0)]);

        let out = builder(&small_battery())
            .build(&horizon(1), 228.0, &ledger)
            .unwrap();

        let stored = 20.0 * 0.892;
        assert!((out.capacity.soc_available - (100.0 + stored)).abs() < 1e-6);
        assert!((out.capacity.soc_headroom - (50.0 - stored)).abs() < 1e-6);
        assert_eq!(out.best_charge_price, 5.0);
    }

    #[test]
    fn test_overflow_clamps_and_warns_once_per_entry() {
        let mut ledger = Ledger::new();
        ledger.insert(
            period(0),
            vec![LedgerEntry::new(-1200.0, 5.0), LedgerEntry::new(2400.0, 80.0)],
        );

        let out = builder(&small_battery())
            .build(&horizon(2), 228.0, &ledger)
            .unwrap();

        assert_eq!(out.warnings.len(), 2);
        assert_eq!(out.warnings[0].kind, CapacityWarningKind::ChargeOverflow);
        assert_eq!(out.warnings[0].quantity, -1200.0);
        assert_eq!(out.warnings[1].kind, CapacityWarningKind::DischargeOverflow);
        assert_eq!(out.warnings[1].period, period(0));

        // the discharge overflow was applied last
        assert_eq!(out.capacity.soc_available, 0.0);
        assert_eq!(out.capacity.soc_headroom, 150.0);
    }

    #[test]
    fn test_zero_quantity_is_noop() {
        let mut ledger = Ledger::new();
        ledger.insert(period(0), vec![LedgerEntry::new(0.0, 10.0)]);

        let out = builder(&small_battery())
            .build(&horizon(1), 228.0, &ledger)
            .unwrap();

        assert_eq!(out.capacity, CapacityState::new(228.0, &small_battery()));
        assert!(out.warnings.is_empty());
        assert_eq!(out.best_charge_price, 999.0);
        assert_eq!(out.best_discharge_price, 0.0);
    }

    #[test]
    fn test_empty_ledger_offers_slack_only() {
        let periods = horizon(3);
        let out = builder(&BatteryConfig::default())
            .build(&periods, 228.0, &Ledger::new())
            .unwrap();

        for p in &periods {
            assert_eq!(out.curves.charge[p], steps(&[125.0], &[0.0]));
            assert_eq!(out.curves.discharge[p], steps(&[125.0], &[0.0]));
        }

        // SoC valuation only for the last period
        assert_eq!(out.curves.soc.len(), 1);
        assert_eq!(
            out.curves.soc[&periods[2]],
            steps(&[100.0, 380.0], &[999.0, 0.0])
        );
    }

    #[test]
    fn test_end_of_horizon_valuation() {
        let periods = horizon(2);
        let mut ledger = Ledger::new();
        // inside the horizon, not part of the valuation
        ledger.insert(periods[0], vec![LedgerEntry::new(0.0, 500.0)]);
        ledger.insert(
            period(30),
            vec![LedgerEntry::new(60.0, 30.0), LedgerEntry::new(-100.0, 60.0)],
        );
        ledger.insert(
            period(35),
            vec![LedgerEntry::new(240.0, 40.0), LedgerEntry::new(120.0, 50.0)],
        );

        // 20 MWh available, 460 headroom
        let out = builder(&BatteryConfig::default())
            .build(&periods, 148.0, &ledger)
            .unwrap();

        assert_eq!(
            out.curves.soc[&periods[1]],
            steps(&[120.0, 0.0, 460.0], &[50.0, 40.0, 0.0])
        );
        assert_eq!(out.best_charge_price, 30.0);
        assert_eq!(out.best_discharge_price, 60.0);
    }

    #[test]
    fn test_unordered_horizon_values_soc_at_latest_period() {
        let periods = [period(10), period(0), period(5)];
        let mut ledger = Ledger::new();
        // inside the horizon even though it is listed first
        ledger.insert(period(10), vec![LedgerEntry::new(600.0, 70.0)]);

        let out = builder(&BatteryConfig::default())
            .build(&periods, 228.0, &ledger)
            .unwrap();

        assert_eq!(out.curves.soc.len(), 1);
        let points = out.curves.soc[&period(10)].points();
        assert_eq!(points.len(), 2);
        assert!((points[0].quantity - 50.0).abs() < TOLERANCE);
        assert_eq!(points[0].price, 999.0);
        assert!((points[1].quantity - 430.0).abs() < TOLERANCE);
        assert_eq!(points[1].price, 0.0);
    }

    #[test]
    fn test_empty_horizon_rejected() {
        let err = builder(&BatteryConfig::default())
            .build(&[], 300.0, &Ledger::new())
            .unwrap_err();
        assert!(matches!(err, OfferError::EmptyForecast));
    }

    #[test]
    fn test_warning_display_names_period() {
        let warning = CapacityWarning {
            period: period(5),
            kind: CapacityWarningKind::DischargeOverflow,
            quantity: 900.0,
        };
        assert_eq!(
            warning.to_string(),
            "period 202408011205: scheduled discharge 900 exceeds available SoC"
        );
    }
}
