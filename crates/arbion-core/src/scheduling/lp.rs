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

use arbion_types::Schedule;
use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use tracing::debug;

use crate::error::{OfferError, Result};
use crate::scheduling::{DispatchLimits, DispatchSolver};

/// Linear-programming dispatch backed by the `minilp` simplex solver
///
/// Variables per period: charge, discharge and the stored energy at the end
/// of the period. Stored energy before the first period is fixed at zero, so
/// it is not a variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct LpDispatchSolver;

impl DispatchSolver for LpDispatchSolver {
    fn name(&self) -> &str {
        "minilp"
    }

    fn solve(&self, prices: &[f64], limits: &DispatchLimits) -> Result<Schedule> {
        let mut problem = Problem::new(OptimizationDirection::Minimize);

        let charge: Vec<Variable> = prices
            .iter()
            .map(|&price| problem.add_var(price, (0.0, limits.chmax)))
            .collect();
        let discharge: Vec<Variable> = prices
            .iter()
            .map(|&price| problem.add_var(-price, (0.0, limits.dcmax)))
            .collect();
        let stored: Vec<Variable> = prices
            .iter()
            .map(|_| problem.add_var(0.0, (0.0, limits.capacity)))
            .collect();

        // stored[t] = stored[t-1] + efficiency * charge[t] - discharge[t]
        for t in 0..prices.len() {
            let mut balance = LinearExpr::empty();
            balance.add(stored[t], 1.0);
            balance.add(charge[t], -limits.efficiency);
            balance.add(discharge[t], 1.0);
            if t > 0 {
                balance.add(stored[t - 1], -1.0);
            }
            problem.add_constraint(balance, ComparisonOp::Eq, 0.0);
        }

        let solution = problem
            .solve()
            .map_err(|err| OfferError::Solver(format!("{} backend: {err}", self.name())))?;

        debug!(
            "LP solved over {} periods, objective {:.3}",
            prices.len(),
            solution.objective()
        );

        Ok(Schedule::new(
            charge.iter().map(|&v| non_negative(solution[v])).collect(),
            discharge.iter().map(|&v| non_negative(solution[v])).collect(),
        ))
    }
}

/// Simplex round-off can leave tiny negatives (or -0.0) on bounded variables
fn non_negative(value: f64) -> f64 {
    if value > 0.0 { value } else { 0.0 }
}
