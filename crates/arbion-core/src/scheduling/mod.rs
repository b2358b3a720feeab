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

mod lp;

pub use lp::LpDispatchSolver;

use arbion_types::{BatteryConfig, Schedule};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{OfferError, Result};

/// Relative slack used when comparing a discharge value against a charge cost
const SPREAD_TOLERANCE: f64 = 1e-9;

/// Physical bounds of the dispatch problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchLimits {
    /// Maximum charging power per period
    pub chmax: f64,
    /// Maximum discharging power per period
    pub dcmax: f64,
    /// Usable energy between the SoC bounds
    pub capacity: f64,
    /// Charging efficiency
    pub efficiency: f64,
}

impl From<&BatteryConfig> for DispatchLimits {
    fn from(battery: &BatteryConfig) -> Self {
        Self {
            chmax: battery.chmax,
            dcmax: battery.dcmax,
            capacity: battery.capacity(),
            efficiency: battery.efficiency,
        }
    }
}

/// Trait for linear-programming backends computing an arbitrage schedule
///
/// Implementations minimize `Σ price[t]·(charge[t] - discharge[t])` subject
/// to the power bounds, the storage balance starting from an empty battery
/// and the capacity bound. Infeasibility or an unavailable backend is
/// reported as [`OfferError::Solver`].
pub trait DispatchSolver: Send + Sync + Debug {
    /// Get the name of this backend
    fn name(&self) -> &str;

    /// Solve one dispatch problem
    fn solve(&self, prices: &[f64], limits: &DispatchLimits) -> Result<Schedule>;
}

/// Computes the profit-maximizing charge/discharge schedule for a forecast
#[derive(Debug, Clone)]
pub struct DispatchScheduler {
    solver: Arc<dyn DispatchSolver>,
    limits: DispatchLimits,
}

impl DispatchScheduler {
    /// Scheduler using the bundled LP backend
    pub fn new(battery: &BatteryConfig) -> Self {
        Self::with_solver(Arc::new(LpDispatchSolver), battery)
    }

    pub fn with_solver(solver: Arc<dyn DispatchSolver>, battery: &BatteryConfig) -> Self {
        Self {
            solver,
            limits: DispatchLimits::from(battery),
        }
    }

    /// Solve the dispatch problem for `prices`
    ///
    /// An all-zero schedule is accepted only when the forecast offers no
    /// profitable spread; otherwise it signals a solver defect.
    pub fn schedule(&self, prices: &[f64]) -> Result<Schedule> {
        if prices.is_empty() {
            return Err(OfferError::EmptyForecast);
        }

        info!(
            "Scheduling {} periods with {} solver",
            prices.len(),
            self.solver.name()
        );
        let schedule = self.solver.solve(prices, &self.limits)?;

        if schedule.charge.len() != prices.len() || schedule.discharge.len() != prices.len() {
            return Err(OfferError::Invariant(format!(
                "solver returned {}/{} charge/discharge values for {} prices",
                schedule.charge.len(),
                schedule.discharge.len(),
                prices.len()
            )));
        }

        for (t, ((ch, dc), price)) in schedule
            .charge
            .iter()
            .zip(&schedule.discharge)
            .zip(prices)
            .enumerate()
        {
            debug!("quantities... time {t} price {price} charge {ch:.3} discharge {dc:.3}");
        }

        if schedule.is_idle() {
            if has_profitable_spread(prices, self.limits.efficiency) {
                return Err(OfferError::Invariant(
                    "idle schedule for a forecast with a profitable spread".to_owned(),
                ));
            }
            info!("Forecast has no profitable spread, battery stays idle");
        } else {
            debug!("Scheduled arbitrage profit {:.3}", schedule.profit(prices));
        }

        Ok(schedule)
    }
}

/// True if energy bought in some period can be sold later at a profit
/// after charging losses
pub fn has_profitable_spread(prices: &[f64], efficiency: f64) -> bool {
    let mut cheapest = f64::INFINITY;
    for &price in prices {
        let value = efficiency * price;
        if value - cheapest > SPREAD_TOLERANCE * value.abs().max(1.0) {
            return true;
        }
        cheapest = cheapest.min(price);
    }
    false
}
